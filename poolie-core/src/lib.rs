pub mod booking;
pub mod identity;
pub mod repository;
pub mod ride;
pub mod search;
pub mod user;
pub mod views;

pub use booking::{Booking, BookingStatus, ResponseAction};
pub use repository::{BoxError, RepoResult};
pub use ride::{Ride, RideKind, RideSchedule, RideStatus};
pub use user::{User, Vehicle};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Ride is no longer available")]
    RideNotAvailable,
    #[error("Not enough available seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: i32, available: i32 },
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),
    #[error("Insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: i32, available: i32 },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Booking has already been responded to (status {0})")]
    AlreadyResponded(BookingStatus),
    #[error("Storage failure: {0}")]
    Storage(#[from] BoxError),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Returned when a stored or submitted string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
