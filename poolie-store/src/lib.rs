pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod memory;
pub mod ride_repo;
mod rows;
pub mod user_repo;

use std::sync::Arc;

use poolie_core::repository::{BookingRepository, RideRepository, UserRepository};

pub use app_config::{Config, StorageBackend};
pub use booking_repo::PostgresBookingRepository;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use ride_repo::PostgresRideRepository;
pub use user_repo::PostgresUserRepository;

/// The repository set the services are wired with.
#[derive(Clone)]
pub struct Repositories {
    pub rides: Arc<dyn RideRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(db: &DbClient) -> Self {
        Self {
            rides: Arc::new(PostgresRideRepository::new(db.pool.clone())),
            bookings: Arc::new(PostgresBookingRepository::new(db.pool.clone())),
            users: Arc::new(PostgresUserRepository::new(db.pool.clone())),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self {
            rides: Arc::new(store.clone()),
            bookings: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}
