use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ride::Price;
use crate::ParseEnumError;

/// Booking lifecycle.
///
/// Driver responses move a booking out of `Pending` exactly once, into `Confirmed` or `Rejected`.
/// `Cancelled` and `Completed` are set by processes outside this service and are accepted as
/// valid stored states without any transition logic here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == BookingStatus::Pending
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "rejected" => Ok(BookingStatus::Rejected),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(ParseEnumError::new("booking status", other)),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver's answer to a pending booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseAction {
    Accept,
    Reject,
}

impl ResponseAction {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            ResponseAction::Accept => BookingStatus::Confirmed,
            ResponseAction::Reject => BookingStatus::Rejected,
        }
    }
}

impl FromStr for ResponseAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(ResponseAction::Accept),
            "reject" => Ok(ResponseAction::Reject),
            other => Err(ParseEnumError::new("action", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub ride_id: String,
    pub passenger_id: String,
    pub status: BookingStatus,
    pub passenger_count: i32,
    /// Snapshot of `ride.price * passenger_count` taken at creation.
    pub total_price: Price,
    pub message: Option<String>,
    pub driver_response_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn pending(
        id: String,
        ride_id: String,
        passenger_id: String,
        passenger_count: i32,
        total_price: Price,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            ride_id,
            passenger_id,
            status: BookingStatus::Pending,
            passenger_count,
            total_price,
            message,
            driver_response_message: None,
            created_at: now,
            responded_at: None,
            updated_at: now,
        }
    }
}
