use std::sync::Arc;

use chrono::Utc;
use poolie_catalog::RideCatalog;
use poolie_core::repository::BookingRepository;
use poolie_core::{Booking, CoreError, CoreResult, ResponseAction, Ride};
use poolie_shared::ids::{new_id, IdKind};
use serde::Deserialize;
use tracing::info;

use crate::reconciliation::SeatReconciler;

/// A passenger's request for seats on a ride.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub ride_id: String,
    pub passenger_count: i32,
    pub message: Option<String>,
}

/// A booking together with the ride it references.
#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub booking: Booking,
    pub ride: Ride,
}

/// Owns booking records and their state transitions.
pub struct BookingLedger {
    catalog: Arc<RideCatalog>,
    bookings: Arc<dyn BookingRepository>,
    reconciler: SeatReconciler,
}

impl BookingLedger {
    pub fn new(catalog: Arc<RideCatalog>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self {
            catalog,
            reconciler: SeatReconciler::new(bookings.clone()),
            bookings,
        }
    }

    /// Create a `pending` booking.
    ///
    /// The status and seat checks run against a possibly stale read; the authoritative capacity
    /// check happens again when the driver accepts.
    pub async fn create_booking(&self, passenger_id: &str, request: NewBooking) -> CoreResult<BookingRecord> {
        if request.ride_id.trim().is_empty() || request.passenger_count < 1 {
            return Err(CoreError::Validation(
                "ride_id and passenger_count (minimum 1) are required".to_string(),
            ));
        }

        // 1. Ride must exist
        let ride = self.catalog.get_ride(&request.ride_id).await?.ride;

        // 2. Ride must be active
        if !ride.is_active() {
            return Err(CoreError::RideNotAvailable);
        }

        // 3. Advisory capacity check
        if !ride.has_seats_for(request.passenger_count) {
            return Err(CoreError::InsufficientSeats {
                requested: request.passenger_count,
                available: ride.available_seats,
            });
        }

        // 4. Snapshot the price
        let total_price = ride.price.times(request.passenger_count).ok_or_else(|| {
            CoreError::Validation("total price exceeds the supported range".to_string())
        })?;

        // 5. Persist as pending
        let booking = Booking::pending(
            new_id(IdKind::Booking),
            ride.id.clone(),
            passenger_id.to_string(),
            request.passenger_count,
            total_price,
            non_empty(request.message),
            Utc::now(),
        );
        self.bookings.insert_booking(&booking).await?;

        info!(
            "Booking requested: {} for {} seat(s) on {} by {}",
            booking.id, booking.passenger_count, ride.id, passenger_id
        );

        Ok(BookingRecord { booking, ride })
    }

    /// Accept or reject a pending booking on behalf of the ride's driver.
    pub async fn respond_to_booking(
        &self,
        booking_id: &str,
        responder_id: &str,
        action: ResponseAction,
        message: Option<String>,
    ) -> CoreResult<BookingRecord> {
        // 1. Booking and its ride
        let BookingRecord { booking, ride } = self.get_booking(booking_id).await?;

        // 2. Only the driver may respond
        if !ride.is_owned_by(responder_id) {
            return Err(CoreError::Forbidden(
                "You are not authorized to respond to this booking".to_string(),
            ));
        }

        // 3. Fail fast; the store re-checks under the write
        if !booking.status.is_pending() {
            return Err(CoreError::AlreadyResponded(booking.status));
        }

        // 4-5. Status change, plus the seat decrement on accept, as one unit
        let transition = SeatReconciler::plan(&booking, action, non_empty(message), Utc::now())?;
        let (booking, updated_ride) = self.reconciler.apply(&transition).await?;

        info!("Booking {} {} by driver {}", booking.id, booking.status, responder_id);

        Ok(BookingRecord {
            booking,
            ride: updated_ride.unwrap_or(ride),
        })
    }

    pub async fn get_booking(&self, booking_id: &str) -> CoreResult<BookingRecord> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking".to_string()))?;
        let ride = self.catalog.get_ride(&booking.ride_id).await?.ride;
        Ok(BookingRecord { booking, ride })
    }
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use poolie_catalog::NewRide;
    use poolie_core::ride::{Location, Price};
    use poolie_core::{BookingStatus, RideKind, RideSchedule, RideStatus, User};
    use poolie_store::memory::MemoryStore;

    const DRIVER: &str = "user_driver";
    const PASSENGER: &str = "user_passenger";

    struct Fixture {
        ledger: Arc<BookingLedger>,
        catalog: Arc<RideCatalog>,
        store: MemoryStore,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        store.insert_user(User::new(DRIVER, "Budi", "budi@example.com")).await;
        store.insert_user(User::new(PASSENGER, "Rina", "rina@example.com")).await;
        let catalog = Arc::new(RideCatalog::new(Arc::new(store.clone())));
        let ledger = Arc::new(BookingLedger::new(catalog.clone(), Arc::new(store.clone())));
        Fixture { ledger, catalog, store }
    }

    async fn publish(catalog: &RideCatalog, seats: i32) -> Ride {
        let new = NewRide {
            kind: RideKind::Carpool,
            ride_type: RideSchedule::OneTime,
            recurrence: None,
            origin: Location { city: "Jakarta".to_string(), address: "Blok M".to_string(), location_point: None },
            destination: Location { city: "Bandung".to_string(), address: "Dago".to_string(), location_point: None },
            departure_time: Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap(),
            arrival_time: None,
            available_seats: seats,
            total_seats: Some(seats),
            price_per_seat: Price { amount: 80_000, currency: "IDR".to_string() },
            vehicle: None,
            amenities: None,
            stops: Vec::new(),
            description: None,
        };
        catalog.create_ride(DRIVER, new).await.unwrap().ride
    }

    fn request(ride: &Ride, count: i32) -> NewBooking {
        NewBooking {
            ride_id: ride.id.clone(),
            passenger_count: count,
            message: Some("Can you pick me up at Blok M?".to_string()),
        }
    }

    #[tokio::test]
    async fn test_booking_lifecycle_accept() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;

        let created = fx.ledger.create_booking(PASSENGER, request(&ride, 3)).await.unwrap();
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.total_price.amount, 240_000);
        assert_eq!(created.booking.total_price.currency, "IDR");
        assert!(created.booking.responded_at.is_none());
        // pending bookings hold no seats
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 4);

        let accepted = fx
            .ledger
            .respond_to_booking(&created.booking.id, DRIVER, ResponseAction::Accept, Some("See you".to_string()))
            .await
            .unwrap();
        assert_eq!(accepted.booking.status, BookingStatus::Confirmed);
        assert!(accepted.booking.responded_at.is_some());
        assert_eq!(accepted.booking.driver_response_message.as_deref(), Some("See you"));
        assert_eq!(accepted.ride.available_seats, 1);
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 1);

        // the advisory check now refuses a second large booking
        let err = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientSeats { requested: 2, available: 1 }));
    }

    #[tokio::test]
    async fn test_reject_leaves_seats_untouched() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;
        let created = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap();

        let rejected = fx
            .ledger
            .respond_to_booking(&created.booking.id, DRIVER, ResponseAction::Reject, None)
            .await
            .unwrap();
        assert_eq!(rejected.booking.status, BookingStatus::Rejected);
        assert!(rejected.booking.responded_at.is_some());
        assert_eq!(rejected.ride.available_seats, 4);
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 4);
    }

    #[tokio::test]
    async fn test_second_response_is_already_responded() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;
        let created = fx.ledger.create_booking(PASSENGER, request(&ride, 1)).await.unwrap();

        fx.ledger
            .respond_to_booking(&created.booking.id, DRIVER, ResponseAction::Accept, None)
            .await
            .unwrap();
        let err = fx
            .ledger
            .respond_to_booking(&created.booking.id, DRIVER, ResponseAction::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResponded(BookingStatus::Confirmed)));
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 3);
    }

    #[tokio::test]
    async fn test_externally_closed_bookings_cannot_be_responded_to() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;

        for closed in [BookingStatus::Cancelled, BookingStatus::Completed] {
            let created = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap();
            let mut stored = created.booking.clone();
            stored.status = closed;
            fx.store.put_booking(stored).await;

            for action in [ResponseAction::Accept, ResponseAction::Reject] {
                let err = fx
                    .ledger
                    .respond_to_booking(&created.booking.id, DRIVER, action, None)
                    .await
                    .unwrap_err();
                assert!(matches!(err, CoreError::AlreadyResponded(status) if status == closed));
            }

            let unchanged = fx.store.booking(&created.booking.id).await.unwrap();
            assert_eq!(unchanged.status, closed);
            assert!(unchanged.responded_at.is_none());
        }
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 4);
    }

    #[tokio::test]
    async fn test_only_the_driver_may_respond() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;
        let created = fx.ledger.create_booking(PASSENGER, request(&ride, 1)).await.unwrap();

        let err = fx
            .ledger
            .respond_to_booking(&created.booking.id, PASSENGER, ResponseAction::Accept, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        let stored = fx.store.booking(&created.booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_booking_and_ride() {
        let fx = fixture().await;
        let err = fx
            .ledger
            .respond_to_booking("booking_missing", DRIVER, ResponseAction::Accept, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let err = fx
            .ledger
            .create_booking(PASSENGER, NewBooking { ride_id: "ride_missing".to_string(), passenger_count: 1, message: None })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_booking_validation_and_availability() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 2).await;

        let err = fx.ledger.create_booking(PASSENGER, request(&ride, 0)).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = fx.ledger.create_booking(PASSENGER, request(&ride, 3)).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientSeats { requested: 3, available: 2 }));

        let mut cancelled = fx.store.ride(&ride.id).await.unwrap();
        cancelled.status = RideStatus::Cancelled;
        fx.store.put_ride(cancelled).await;
        let err = fx.ledger.create_booking(PASSENGER, request(&ride, 1)).await.unwrap_err();
        assert!(matches!(err, CoreError::RideNotAvailable));
    }

    #[tokio::test]
    async fn test_failed_acceptance_keeps_booking_pending() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;
        let first = fx.ledger.create_booking(PASSENGER, request(&ride, 3)).await.unwrap();
        let second = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap();

        fx.ledger
            .respond_to_booking(&first.booking.id, DRIVER, ResponseAction::Accept, None)
            .await
            .unwrap();
        let err = fx
            .ledger
            .respond_to_booking(&second.booking.id, DRIVER, ResponseAction::Accept, Some("ok".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCapacity { requested: 2, available: 1 }));

        let stored = fx.store.booking(&second.booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert!(stored.responded_at.is_none());
        assert!(stored.driver_response_message.is_none());
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 1);

        // the driver can still reject it
        let rejected = fx
            .ledger
            .respond_to_booking(&second.booking.id, DRIVER, ResponseAction::Reject, None)
            .await
            .unwrap();
        assert_eq!(rejected.booking.status, BookingStatus::Rejected);
    }

    #[tokio::test]
    async fn test_total_price_is_snapshotted() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;
        let created = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap();

        let mut repriced = fx.store.ride(&ride.id).await.unwrap();
        repriced.price.amount = 150_000;
        fx.store.put_ride(repriced).await;

        let accepted = fx
            .ledger
            .respond_to_booking(&created.booking.id, DRIVER, ResponseAction::Accept, None)
            .await
            .unwrap();
        assert_eq!(accepted.booking.total_price.amount, 160_000);
        assert_eq!(fx.store.booking(&created.booking.id).await.unwrap().total_price.amount, 160_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acceptances_never_oversell() {
        for _ in 0..20 {
            let fx = fixture().await;
            let ride = publish(&fx.catalog, 4).await;
            let first = fx.ledger.create_booking(PASSENGER, request(&ride, 3)).await.unwrap();
            let second = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap();

            let handles: Vec<_> = [first.booking.id, second.booking.id]
                .into_iter()
                .map(|id| {
                    let ledger = fx.ledger.clone();
                    tokio::spawn(async move {
                        ledger.respond_to_booking(&id, DRIVER, ResponseAction::Accept, None).await
                    })
                })
                .collect();

            let mut successes = 0;
            let mut capacity_failures = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => successes += 1,
                    Err(CoreError::InsufficientCapacity { .. }) => capacity_failures += 1,
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            assert_eq!(successes, 1);
            assert_eq!(capacity_failures, 1);

            let remaining = fx.store.ride(&ride.id).await.unwrap().available_seats;
            assert!(remaining == 1 || remaining == 2, "remaining seats {remaining}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_responses_to_one_booking() {
        let fx = fixture().await;
        let ride = publish(&fx.catalog, 4).await;
        let created = fx.ledger.create_booking(PASSENGER, request(&ride, 2)).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = fx.ledger.clone();
                let id = created.booking.id.clone();
                tokio::spawn(async move { ledger.respond_to_booking(&id, DRIVER, ResponseAction::Accept, None).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(CoreError::AlreadyResponded(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(fx.store.ride(&ride.id).await.unwrap().available_seats, 2);
    }
}
