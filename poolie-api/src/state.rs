use std::sync::Arc;

use poolie_booking::BookingLedger;
use poolie_catalog::RideCatalog;
use poolie_core::identity::TokenVerifier;
use poolie_core::repository::UserRepository;
use poolie_store::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RideCatalog>,
    pub ledger: Arc<BookingLedger>,
    pub users: Arc<dyn UserRepository>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(repos: Repositories, verifier: Arc<dyn TokenVerifier>) -> Self {
        let catalog = Arc::new(RideCatalog::new(repos.rides));
        let ledger = Arc::new(BookingLedger::new(catalog.clone(), repos.bookings));
        Self {
            catalog,
            ledger,
            users: repos.users,
            verifier,
        }
    }
}
