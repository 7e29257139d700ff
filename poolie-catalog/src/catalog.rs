use std::sync::Arc;

use chrono::{DateTime, Utc};
use poolie_core::repository::{RideRecord, RideRepository, SeatUpdate};
use poolie_core::ride::{Amenities, Location, Price, Recurrence, Stop};
use poolie_core::search::RideSearchQuery;
use poolie_core::{CoreError, CoreResult, Ride, RideKind, RideSchedule, RideStatus, Vehicle};
use poolie_shared::ids::{new_id, IdKind};
use serde::Deserialize;
use tracing::{info, warn};

use crate::inventory::{decrement_amount, duration_minutes, Capacity};

const DEFAULT_CANCELLATION_POLICY: &str = "never_cancels";

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleSpec {
    pub make: String,
    pub model: String,
    pub color: String,
    pub license_plate: Option<String>,
    pub year: Option<i32>,
}

/// Fields a driver supplies when publishing a ride.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRide {
    #[serde(rename = "type", default)]
    pub kind: RideKind,
    #[serde(default)]
    pub ride_type: RideSchedule,
    pub recurrence: Option<Recurrence>,
    pub origin: Location,
    pub destination: Location,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub available_seats: i32,
    pub total_seats: Option<i32>,
    pub price_per_seat: Price,
    pub vehicle: Option<VehicleSpec>,
    pub amenities: Option<Amenities>,
    #[serde(default)]
    pub stops: Vec<Stop>,
    pub description: Option<String>,
}

// Column widths of the `rides` and `vehicles` tables, in characters.
const MAX_CITY_LEN: usize = 128;
const MAX_LOCATION_POINT_LEN: usize = 64;
const MAX_VEHICLE_NAME_LEN: usize = 64;
const MAX_VEHICLE_COLOR_LEN: usize = 32;
const MAX_LICENSE_PLATE_LEN: usize = 32;

fn check_len(field: &str, value: &str, max: usize) -> CoreResult<()> {
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!("{} must be at most {} characters", field, max)));
    }
    Ok(())
}

/// ISO 4217 style: three uppercase ASCII letters.
fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

impl NewRide {
    fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("origin.city", &self.origin.city),
            ("origin.address", &self.origin.address),
            ("destination.city", &self.destination.city),
            ("destination.address", &self.destination.address),
            ("price_per_seat.currency", &self.price_per_seat.currency),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{} is required", field)));
            }
        }

        check_len("origin.city", &self.origin.city, MAX_CITY_LEN)?;
        check_len("destination.city", &self.destination.city, MAX_CITY_LEN)?;
        for (field, point) in [
            ("origin.location_point", &self.origin.location_point),
            ("destination.location_point", &self.destination.location_point),
        ] {
            if let Some(point) = point {
                check_len(field, point, MAX_LOCATION_POINT_LEN)?;
            }
        }

        if !is_currency_code(&self.price_per_seat.currency) {
            return Err(CoreError::Validation(
                "price_per_seat.currency must be a 3-letter uppercase code".to_string(),
            ));
        }

        if self.price_per_seat.amount <= 0 {
            return Err(CoreError::Validation("price_per_seat.amount must be positive".to_string()));
        }

        match (&self.ride_type, &self.recurrence) {
            (RideSchedule::Recurring, None) => {
                return Err(CoreError::Validation("recurring rides require a recurrence".to_string()));
            }
            (_, Some(recurrence)) => {
                if let Some(end) = recurrence.end_date {
                    if end < recurrence.start_date {
                        return Err(CoreError::Validation(
                            "recurrence.end_date must not precede start_date".to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }

        if let Some(vehicle) = &self.vehicle {
            if vehicle.make.trim().is_empty() || vehicle.model.trim().is_empty() || vehicle.color.trim().is_empty() {
                return Err(CoreError::Validation("vehicle make, model and color are required".to_string()));
            }
            check_len("vehicle.make", &vehicle.make, MAX_VEHICLE_NAME_LEN)?;
            check_len("vehicle.model", &vehicle.model, MAX_VEHICLE_NAME_LEN)?;
            check_len("vehicle.color", &vehicle.color, MAX_VEHICLE_COLOR_LEN)?;
            if let Some(plate) = &vehicle.license_plate {
                check_len("vehicle.license_plate", plate, MAX_LICENSE_PLATE_LEN)?;
            }
        }

        Ok(())
    }
}

/// Owns ride records: capacity, status and pricing.
pub struct RideCatalog {
    rides: Arc<dyn RideRepository>,
}

impl RideCatalog {
    pub fn new(rides: Arc<dyn RideRepository>) -> Self {
        Self { rides }
    }

    pub async fn get_ride(&self, id: &str) -> CoreResult<RideRecord> {
        self.rides
            .get_ride(id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Ride".to_string()))
    }

    /// Active rides matching the query, ordered by departure time. No pagination.
    pub async fn search_rides(&self, query: &RideSearchQuery) -> CoreResult<Vec<RideRecord>> {
        let records = self.rides.search_rides(query).await?;
        info!(
            "Ride search {} -> {} on {}: {} results",
            query.origin,
            query.destination,
            query.date,
            records.len()
        );
        Ok(records)
    }

    pub async fn create_ride(&self, driver_id: &str, new: NewRide) -> CoreResult<RideRecord> {
        new.validate()?;
        let capacity = Capacity::opening(new.available_seats, new.total_seats)?;
        let duration = duration_minutes(new.departure_time, new.arrival_time)?;

        let vehicle = new.vehicle.map(|spec| Vehicle {
            id: new_id(IdKind::Vehicle),
            user_id: driver_id.to_string(),
            make: spec.make,
            model: spec.model,
            color: spec.color,
            license_plate: spec.license_plate,
            year: spec.year,
        });

        let now = Utc::now();
        let ride = Ride {
            id: new_id(IdKind::Ride),
            driver_id: driver_id.to_string(),
            vehicle_id: vehicle.as_ref().map(|v| v.id.clone()),
            kind: new.kind,
            schedule: new.ride_type,
            recurrence: new.recurrence,
            departure_time: new.departure_time,
            arrival_time: new.arrival_time,
            duration_minutes: duration,
            origin: new.origin,
            destination: new.destination,
            price: new.price_per_seat,
            available_seats: capacity.available,
            total_seats: capacity.total,
            amenities: new.amenities,
            stops: new.stops,
            instant_confirmation: true,
            cancellation_policy: DEFAULT_CANCELLATION_POLICY.to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
            status: RideStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.rides.insert_ride(&ride, vehicle.as_ref()).await?;
        info!("Ride published: {} by {} ({} seats)", ride.id, driver_id, ride.total_seats);

        self.get_ride(&ride.id).await
    }

    /// Conditional decrement, re-checked by the store at write time.
    pub async fn decrement_available_seats(&self, ride_id: &str, seats: i32) -> CoreResult<Ride> {
        let seats = decrement_amount(seats)?;
        match self.rides.decrement_available_seats(ride_id, seats).await? {
            SeatUpdate::Applied(ride) => Ok(ride),
            SeatUpdate::Insufficient { available } => {
                warn!("Seat decrement refused on {}: requested {}, available {}", ride_id, seats, available);
                Err(CoreError::InsufficientCapacity { requested: seats, available })
            }
            SeatUpdate::RideNotFound => Err(CoreError::NotFound("Ride".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use poolie_core::search::TypeFilter;
    use poolie_core::User;
    use poolie_store::memory::MemoryStore;

    fn new_ride(origin: &str, destination: &str, departure: DateTime<Utc>, seats: i32) -> NewRide {
        NewRide {
            kind: RideKind::Carpool,
            ride_type: RideSchedule::OneTime,
            recurrence: None,
            origin: Location { city: origin.to_string(), address: "Terminal".to_string(), location_point: None },
            destination: Location { city: destination.to_string(), address: "Station".to_string(), location_point: None },
            departure_time: departure,
            arrival_time: None,
            available_seats: seats,
            total_seats: None,
            price_per_seat: Price { amount: 100_000, currency: "IDR".to_string() },
            vehicle: None,
            amenities: None,
            stops: Vec::new(),
            description: None,
        }
    }

    async fn catalog() -> (RideCatalog, MemoryStore) {
        let store = MemoryStore::new();
        store.insert_user(User::new("user_driver", "Budi", "budi@example.com")).await;
        (RideCatalog::new(Arc::new(store.clone())), store)
    }

    fn june(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_ride_starts_at_full_capacity() {
        let (catalog, _) = catalog().await;
        let mut new = new_ride("Jakarta", "Bandung", june(1, 7), 4);
        new.arrival_time = Some(june(1, 10));
        new.vehicle = Some(VehicleSpec {
            make: "Toyota".to_string(),
            model: "Avanza".to_string(),
            color: "Silver".to_string(),
            license_plate: None,
            year: Some(2021),
        });

        let record = catalog.create_ride("user_driver", new).await.unwrap();
        assert!(record.ride.id.starts_with("ride_"));
        assert_eq!(record.ride.total_seats, 4);
        assert_eq!(record.ride.available_seats, 4);
        assert_eq!(record.ride.duration_minutes, Some(180));
        assert_eq!(record.ride.status, RideStatus::Active);
        assert_eq!(record.driver.unwrap().name, "Budi");
        assert_eq!(record.vehicle.unwrap().model, "Avanza");
    }

    #[tokio::test]
    async fn test_create_ride_rejects_partial_capacity() {
        let (catalog, _) = catalog().await;
        let mut new = new_ride("Jakarta", "Bandung", june(1, 7), 3);
        new.total_seats = Some(4);
        let err = catalog.create_ride("user_driver", new).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidCapacity(_)));
    }

    #[tokio::test]
    async fn test_create_ride_validates_recurrence() {
        let (catalog, _) = catalog().await;
        let mut new = new_ride("Jakarta", "Bandung", june(1, 7), 2);
        new.ride_type = RideSchedule::Recurring;
        let err = catalog.create_ride("user_driver", new).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_ride_enforces_column_limits() {
        let (catalog, _) = catalog().await;

        let mut bad_currency = new_ride("Jakarta", "Bandung", june(1, 7), 2);
        bad_currency.price_per_seat.currency = "RUPIAH".to_string();
        assert!(matches!(catalog.create_ride("user_driver", bad_currency).await, Err(CoreError::Validation(_))));

        let mut lowercase = new_ride("Jakarta", "Bandung", june(1, 7), 2);
        lowercase.price_per_seat.currency = "idr".to_string();
        assert!(matches!(catalog.create_ride("user_driver", lowercase).await, Err(CoreError::Validation(_))));

        let long_city = "J".repeat(MAX_CITY_LEN + 1);
        let err = catalog
            .create_ride("user_driver", new_ride(&long_city, "Bandung", june(1, 7), 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut long_color = new_ride("Jakarta", "Bandung", june(1, 7), 2);
        long_color.vehicle = Some(VehicleSpec {
            make: "Toyota".to_string(),
            model: "Avanza".to_string(),
            color: "c".repeat(MAX_VEHICLE_COLOR_LEN + 1),
            license_plate: None,
            year: None,
        });
        assert!(matches!(catalog.create_ride("user_driver", long_color).await, Err(CoreError::Validation(_))));

        // exactly at the limit is accepted
        let at_limit = "K".repeat(MAX_CITY_LEN);
        assert!(catalog.create_ride("user_driver", new_ride(&at_limit, "Bandung", june(1, 7), 2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_unknown_ride_is_not_found() {
        let (catalog, _) = catalog().await;
        assert!(matches!(catalog.get_ride("ride_missing").await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_filters_city_window_status_and_type() {
        let (catalog, store) = catalog().await;
        let hit = catalog.create_ride("user_driver", new_ride("Jakarta Selatan", "Bandung", june(1, 7), 4)).await.unwrap();
        let late = catalog.create_ride("user_driver", new_ride("Jakarta", "Bandung Barat", june(1, 23), 4)).await.unwrap();
        // next day, exactly at the window end
        catalog.create_ride("user_driver", new_ride("Jakarta", "Bandung", june(2, 0), 4)).await.unwrap();
        // case-sensitive substring
        catalog.create_ride("user_driver", new_ride("jakarta", "Bandung", june(1, 8), 4)).await.unwrap();
        let mut bus = new_ride("Jakarta", "Bandung", june(1, 9), 30);
        bus.kind = RideKind::Bus;
        let bus = catalog.create_ride("user_driver", bus).await.unwrap();
        let cancelled = catalog.create_ride("user_driver", new_ride("Jakarta", "Bandung", june(1, 12), 4)).await.unwrap();
        let mut ride = cancelled.ride.clone();
        ride.status = RideStatus::Cancelled;
        store.put_ride(ride).await;

        let mut query = RideSearchQuery {
            origin: "Jakarta".to_string(),
            destination: "Bandung".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            kind: TypeFilter::All,
            min_seats: None,
        };
        let ids: Vec<String> = catalog.search_rides(&query).await.unwrap().into_iter().map(|r| r.ride.id).collect();
        assert_eq!(ids, vec![hit.ride.id.clone(), bus.ride.id.clone(), late.ride.id.clone()]);

        query.kind = TypeFilter::Only(RideKind::Bus);
        let ids: Vec<String> = catalog.search_rides(&query).await.unwrap().into_iter().map(|r| r.ride.id).collect();
        assert_eq!(ids, vec![bus.ride.id.clone()]);

        query.kind = TypeFilter::All;
        query.min_seats = Some(5);
        let ids: Vec<String> = catalog.search_rides(&query).await.unwrap().into_iter().map(|r| r.ride.id).collect();
        assert_eq!(ids, vec![bus.ride.id]);
    }

    #[tokio::test]
    async fn test_decrement_available_seats() {
        let (catalog, _) = catalog().await;
        let record = catalog.create_ride("user_driver", new_ride("Jakarta", "Bandung", june(1, 7), 4)).await.unwrap();
        let id = record.ride.id;

        let ride = catalog.decrement_available_seats(&id, 3).await.unwrap();
        assert_eq!(ride.available_seats, 1);

        let err = catalog.decrement_available_seats(&id, 2).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCapacity { requested: 2, available: 1 }));
        assert_eq!(catalog.get_ride(&id).await.unwrap().ride.available_seats, 1);

        assert!(matches!(catalog.decrement_available_seats(&id, 0).await, Err(CoreError::InvalidCapacity(_))));
        assert!(matches!(catalog.decrement_available_seats("ride_missing", 1).await, Err(CoreError::NotFound(_))));
    }
}
