pub mod catalog;
pub mod inventory;

pub use catalog::{NewRide, RideCatalog, VehicleSpec};
pub use inventory::{Capacity, CapacityError};
