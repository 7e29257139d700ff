use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::booking::{Booking, BookingStatus};
use crate::ride::Ride;
use crate::search::RideSearchQuery;
use crate::user::{User, Vehicle};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, BoxError>;

/// A ride joined with its driver and vehicle.
#[derive(Debug, Clone)]
pub struct RideRecord {
    pub ride: Ride,
    pub driver: Option<User>,
    pub vehicle: Option<Vehicle>,
}

/// Result of a conditional seat decrement.
#[derive(Debug, Clone, PartialEq)]
pub enum SeatUpdate {
    Applied(Ride),
    /// The guard `available_seats >= seats` failed at write time.
    Insufficient { available: i32 },
    RideNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatDecrement {
    pub ride_id: String,
    pub seats: i32,
}

/// A driver response to apply as a single atomic unit.
///
/// Stores must only apply it while the booking is still `pending`, and when a seat decrement is
/// attached, only when the decrement guard also holds. Otherwise nothing is written.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingTransition {
    pub booking_id: String,
    pub to: BookingStatus,
    pub responded_at: DateTime<Utc>,
    pub driver_response_message: Option<String>,
    pub seat_decrement: Option<SeatDecrement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied { booking: Booking, ride: Option<Ride> },
    BookingNotFound,
    /// Someone else already moved the booking out of `pending`.
    NotPending { current: BookingStatus },
    Insufficient { available: i32 },
    RideNotFound,
}

/// Repository trait for ride data access
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn get_ride(&self, id: &str) -> RepoResult<Option<RideRecord>>;

    async fn search_rides(&self, query: &RideSearchQuery) -> RepoResult<Vec<RideRecord>>;

    /// Persist a new ride, and its vehicle when one is given, in one transaction.
    async fn insert_ride(&self, ride: &Ride, vehicle: Option<&Vehicle>) -> RepoResult<()>;

    /// Atomic read-modify-write: decrement iff enough seats remain.
    async fn decrement_available_seats(&self, ride_id: &str, seats: i32) -> RepoResult<SeatUpdate>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()>;

    async fn get_booking(&self, id: &str) -> RepoResult<Option<Booking>>;

    async fn apply_transition(&self, transition: &BookingTransition) -> RepoResult<TransitionOutcome>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
}
