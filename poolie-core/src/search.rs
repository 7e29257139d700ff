use chrono::{DateTime, Days, NaiveDate, Utc};
use std::str::FromStr;

use crate::ride::{Ride, RideKind};
use crate::ParseEnumError;

/// `type` query parameter. An empty value or the sentinel `all` disables the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(RideKind),
}

impl FromStr for TypeFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(TypeFilter::All),
            other => other.parse().map(TypeFilter::Only),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideSearchQuery {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub kind: TypeFilter,
    pub min_seats: Option<i32>,
}

impl RideSearchQuery {
    /// Half-open departure window `[date 00:00 UTC, date+1 00:00 UTC)`.
    pub fn departure_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let end = self
            .date
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }

    /// Reference predicate; SQL stores must express the same conditions.
    ///
    /// City matching is a case-sensitive substring test.
    pub fn matches(&self, ride: &Ride) -> bool {
        let (start, end) = self.departure_window();
        if !ride.is_active() {
            return false;
        }
        if !ride.origin.city.contains(&self.origin) || !ride.destination.city.contains(&self.destination) {
            return false;
        }
        if ride.departure_time < start || ride.departure_time >= end {
            return false;
        }
        if let TypeFilter::Only(kind) = self.kind {
            if ride.kind != kind {
                return false;
            }
        }
        match self.min_seats {
            Some(seats) => ride.has_seats_for(seats),
            None => true,
        }
    }
}
