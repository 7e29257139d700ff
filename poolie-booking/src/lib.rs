pub mod ledger;
pub mod reconciliation;

pub use ledger::{BookingLedger, BookingRecord, NewBooking};
pub use reconciliation::SeatReconciler;
