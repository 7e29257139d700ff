use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Lifecycle of a published ride. Rides are never deleted; they leave `Active` instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Cancelled,
    Completed,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Active => "active",
            RideStatus::Cancelled => "cancelled",
            RideStatus::Completed => "completed",
        }
    }
}

impl FromStr for RideStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RideStatus::Active),
            "cancelled" => Ok(RideStatus::Cancelled),
            "completed" => Ok(RideStatus::Completed),
            other => Err(ParseEnumError::new("ride status", other)),
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle class of the offering, stored in the `type` column.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RideKind {
    #[default]
    Carpool,
    Bus,
}

impl RideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideKind::Carpool => "carpool",
            RideKind::Bus => "bus",
        }
    }
}

impl FromStr for RideKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carpool" => Ok(RideKind::Carpool),
            "bus" => Ok(RideKind::Bus),
            other => Err(ParseEnumError::new("ride type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RideSchedule {
    #[default]
    OneTime,
    Recurring,
}

impl RideSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideSchedule::OneTime => "one_time",
            RideSchedule::Recurring => "recurring",
        }
    }
}

impl FromStr for RideSchedule {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_time" => Ok(RideSchedule::OneTime),
            "recurring" => Ok(RideSchedule::Recurring),
            other => Err(ParseEnumError::new("ride schedule", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_point: Option<String>,
}

/// Integer minor-unit amount plus ISO currency code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Price {
    pub amount: i64,
    pub currency: String,
}

impl Price {
    /// Price for `count` units, `None` on overflow.
    pub fn times(&self, count: i32) -> Option<Price> {
        self.amount.checked_mul(i64::from(count)).map(|amount| Price {
            amount,
            currency: self.currency.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Amenities {
    #[serde(default)]
    pub smoking_allowed: bool,
    #[serde(default)]
    pub air_conditioner: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Recurrence pattern of a recurring ride. Occurrences are not expanded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recurrence {
    pub days_of_week: Vec<DayOfWeek>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Pickup,
    Dropoff,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stop {
    pub location: Location,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: StopKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ride {
    pub id: String,
    pub driver_id: String,
    pub vehicle_id: Option<String>,
    pub kind: RideKind,
    pub schedule: RideSchedule,
    pub recurrence: Option<Recurrence>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub origin: Location,
    pub destination: Location,
    pub price: Price,
    pub available_seats: i32,
    pub total_seats: i32,
    pub amenities: Option<Amenities>,
    pub stops: Vec<Stop>,
    pub instant_confirmation: bool,
    pub cancellation_policy: String,
    pub description: Option<String>,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn is_active(&self) -> bool {
        self.status == RideStatus::Active
    }

    pub fn has_seats_for(&self, count: i32) -> bool {
        self.available_seats >= count
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.driver_id == user_id
    }

    /// Decrement `available_seats` by `seats` iff that many remain. Returns whether it applied.
    pub fn try_take_seats(&mut self, seats: i32) -> bool {
        if seats <= 0 || !self.has_seats_for(seats) {
            return false;
        }
        self.available_seats -= seats;
        true
    }
}
