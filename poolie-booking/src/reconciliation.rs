use std::sync::Arc;

use chrono::{DateTime, Utc};
use poolie_catalog::inventory::decrement_amount;
use poolie_core::repository::{BookingRepository, BookingTransition, SeatDecrement, TransitionOutcome};
use poolie_core::{Booking, CoreError, CoreResult, ResponseAction, Ride};
use tracing::{info, warn};

/// Couples a booking's exit from `pending` with the ride's seat count.
///
/// An acceptance carries a seat decrement of `passenger_count`; the store applies both writes in
/// one transaction and re-checks `available_seats >= passenger_count` under the write. If either
/// guard fails nothing is persisted and the booking stays `pending`.
pub struct SeatReconciler {
    bookings: Arc<dyn BookingRepository>,
}

impl SeatReconciler {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Build the transition for a driver response. Only acceptances touch seats.
    pub fn plan(
        booking: &Booking,
        action: ResponseAction,
        driver_response_message: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingTransition> {
        let seat_decrement = match action {
            ResponseAction::Accept => Some(SeatDecrement {
                ride_id: booking.ride_id.clone(),
                seats: decrement_amount(booking.passenger_count)?,
            }),
            ResponseAction::Reject => None,
        };

        Ok(BookingTransition {
            booking_id: booking.id.clone(),
            to: action.target_status(),
            responded_at: now,
            driver_response_message,
            seat_decrement,
        })
    }

    /// Apply a planned transition atomically. Returns the updated booking and, for an
    /// acceptance, the ride as it stands after the decrement.
    pub async fn apply(&self, transition: &BookingTransition) -> CoreResult<(Booking, Option<Ride>)> {
        match self.bookings.apply_transition(transition).await? {
            TransitionOutcome::Applied { booking, ride } => {
                if let Some(ride) = &ride {
                    info!(
                        "Seats reconciled on {}: {} of {} remaining after booking {}",
                        ride.id, ride.available_seats, ride.total_seats, booking.id
                    );
                }
                Ok((booking, ride))
            }
            TransitionOutcome::NotPending { current } => {
                warn!("Booking {} already left pending (now {})", transition.booking_id, current);
                Err(CoreError::AlreadyResponded(current))
            }
            TransitionOutcome::Insufficient { available } => {
                let requested = transition.seat_decrement.as_ref().map(|d| d.seats).unwrap_or_default();
                warn!(
                    "Acceptance of {} rolled back: requested {} seats, {} available",
                    transition.booking_id, requested, available
                );
                Err(CoreError::InsufficientCapacity { requested, available })
            }
            TransitionOutcome::BookingNotFound => Err(CoreError::NotFound("Booking".to_string())),
            TransitionOutcome::RideNotFound => Err(CoreError::NotFound("Ride".to_string())),
        }
    }
}
