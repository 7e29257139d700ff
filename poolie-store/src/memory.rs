use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use poolie_core::repository::{
    BookingRepository, BookingTransition, RepoResult, RideRecord, RideRepository, SeatUpdate, TransitionOutcome,
    UserRepository,
};
use poolie_core::search::RideSearchQuery;
use poolie_core::{Booking, Ride, User, Vehicle};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    vehicles: HashMap<String, Vehicle>,
    rides: HashMap<String, Ride>,
    bookings: HashMap<String, Booking>,
}

impl MemoryState {
    fn record(&self, ride: &Ride) -> RideRecord {
        RideRecord {
            ride: ride.clone(),
            driver: self.users.get(&ride.driver_id).cloned(),
            vehicle: ride.vehicle_id.as_ref().and_then(|id| self.vehicles.get(id)).cloned(),
        }
    }
}

/// In-process store for development and tests.
///
/// Every write runs under a single write guard, so a booking transition and its seat decrement
/// become visible together or not at all. Foreign keys are checked the way the schema does.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    /// Replace a ride wholesale. Stands in for processes that edit rides outside this service.
    pub async fn put_ride(&self, ride: Ride) {
        self.state.write().await.rides.insert(ride.id.clone(), ride);
    }

    /// Replace a booking wholesale, e.g. one cancelled by another process.
    pub async fn put_booking(&self, booking: Booking) {
        self.state.write().await.bookings.insert(booking.id.clone(), booking);
    }

    pub async fn ride(&self, id: &str) -> Option<Ride> {
        self.state.read().await.rides.get(id).cloned()
    }

    pub async fn booking(&self, id: &str) -> Option<Booking> {
        self.state.read().await.bookings.get(id).cloned()
    }
}

#[async_trait]
impl RideRepository for MemoryStore {
    async fn get_ride(&self, id: &str) -> RepoResult<Option<RideRecord>> {
        let state = self.state.read().await;
        Ok(state.rides.get(id).map(|ride| state.record(ride)))
    }

    async fn search_rides(&self, query: &RideSearchQuery) -> RepoResult<Vec<RideRecord>> {
        let state = self.state.read().await;
        let mut rides: Vec<&Ride> = state.rides.values().filter(|ride| query.matches(ride)).collect();
        rides.sort_by(|a, b| a.departure_time.cmp(&b.departure_time).then_with(|| a.id.cmp(&b.id)));
        Ok(rides.into_iter().map(|ride| state.record(ride)).collect())
    }

    async fn insert_ride(&self, ride: &Ride, vehicle: Option<&Vehicle>) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&ride.driver_id) {
            return Err(format!("driver {} does not exist", ride.driver_id).into());
        }
        if state.rides.contains_key(&ride.id) {
            return Err(format!("ride {} already exists", ride.id).into());
        }
        if let Some(vehicle) = vehicle {
            state.vehicles.insert(vehicle.id.clone(), vehicle.clone());
        }
        state.rides.insert(ride.id.clone(), ride.clone());
        Ok(())
    }

    async fn decrement_available_seats(&self, ride_id: &str, seats: i32) -> RepoResult<SeatUpdate> {
        let mut state = self.state.write().await;
        let Some(ride) = state.rides.get_mut(ride_id) else {
            return Ok(SeatUpdate::RideNotFound);
        };
        if !ride.try_take_seats(seats) {
            return Ok(SeatUpdate::Insufficient { available: ride.available_seats });
        }
        ride.updated_at = chrono::Utc::now();
        Ok(SeatUpdate::Applied(ride.clone()))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if !state.rides.contains_key(&booking.ride_id) {
            return Err(format!("ride {} does not exist", booking.ride_id).into());
        }
        if !state.users.contains_key(&booking.passenger_id) {
            return Err(format!("passenger {} does not exist", booking.passenger_id).into());
        }
        state.bookings.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: &str) -> RepoResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(id).cloned())
    }

    async fn apply_transition(&self, transition: &BookingTransition) -> RepoResult<TransitionOutcome> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(current) = state.bookings.get(&transition.booking_id) else {
            return Ok(TransitionOutcome::BookingNotFound);
        };
        if !current.status.is_pending() {
            return Ok(TransitionOutcome::NotPending { current: current.status });
        }

        // Stage both writes, commit only when every guard holds
        let ride = match &transition.seat_decrement {
            Some(decrement) => {
                let Some(stored) = state.rides.get(&decrement.ride_id) else {
                    return Ok(TransitionOutcome::RideNotFound);
                };
                let mut staged = stored.clone();
                if !staged.try_take_seats(decrement.seats) {
                    return Ok(TransitionOutcome::Insufficient { available: stored.available_seats });
                }
                staged.updated_at = transition.responded_at;
                Some(staged)
            }
            None => None,
        };

        let mut booking = current.clone();
        booking.status = transition.to;
        booking.responded_at = Some(transition.responded_at);
        booking.driver_response_message = transition.driver_response_message.clone();
        booking.updated_at = transition.responded_at;

        if let Some(ride) = &ride {
            state.rides.insert(ride.id.clone(), ride.clone());
        }
        state.bookings.insert(booking.id.clone(), booking.clone());

        Ok(TransitionOutcome::Applied { booking, ride })
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }
}
