use chrono::{DateTime, Utc};
use poolie_core::CoreError;

/// Seat capacity of a ride, `0 <= available <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub total: i32,
    pub available: i32,
}

impl Capacity {
    /// Capacity of a newly published ride. Publishing always starts at full capacity.
    pub fn opening(available: i32, total: Option<i32>) -> Result<Self, CapacityError> {
        let total = total.unwrap_or(available);
        if total <= 0 {
            return Err(CapacityError::NonPositive(total));
        }
        if available != total {
            return Err(CapacityError::NotFull { total, available });
        }
        Ok(Self { total, available })
    }
}

/// Seat count requested from a decrement; must be positive.
pub fn decrement_amount(seats: i32) -> Result<i32, CapacityError> {
    if seats <= 0 {
        return Err(CapacityError::NonPositive(seats));
    }
    Ok(seats)
}

/// Whole minutes between departure and arrival, when an arrival is known.
pub fn duration_minutes(
    departure: DateTime<Utc>,
    arrival: Option<DateTime<Utc>>,
) -> Result<Option<i32>, CoreError> {
    let Some(arrival) = arrival else {
        return Ok(None);
    };
    if arrival <= departure {
        return Err(CoreError::Validation(
            "arrival_time must be after departure_time".to_string(),
        ));
    }
    let minutes = (arrival - departure).num_minutes();
    i32::try_from(minutes)
        .map(Some)
        .map_err(|_| CoreError::Validation("ride duration is too long".to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("seat count must be positive, got {0}")]
    NonPositive(i32),

    #[error("available_seats ({available}) must equal total_seats ({total}) when publishing")]
    NotFull { total: i32, available: i32 },
}

impl From<CapacityError> for CoreError {
    fn from(err: CapacityError) -> Self {
        CoreError::InvalidCapacity(err.to_string())
    }
}
