//! Response shapes built from persisted entities.
//!
//! Everything here is a pure mapping; absent optional fields are omitted from the JSON output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::booking::{Booking, BookingStatus};
use crate::repository::RideRecord;
use crate::ride::{Amenities, Location, Price, Recurrence, Ride, RideKind, RideSchedule, Stop};
use crate::user::{User, UserPreferences, Vehicle};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DriverSummary {
    pub user_id: String,
    pub name: String,
    pub rating: f64,
    pub rating_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    pub is_verified: bool,
}

impl From<&User> for DriverSummary {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            rating: user.rating,
            rating_count: user.rating_count,
            profile_picture_url: user.profile_picture_url.clone(),
            is_verified: user.is_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VehicleSummary {
    pub make: String,
    pub model: String,
    pub color: String,
}

impl From<&Vehicle> for VehicleSummary {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            color: vehicle.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookingPolicies {
    pub instant_confirmation: bool,
    pub cancellation_policy: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RidePreview {
    pub ride_id: String,
    #[serde(rename = "type")]
    pub kind: RideKind,
    pub ride_type: RideSchedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    pub departure_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    pub origin: Location,
    pub destination: Location,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverSummary>,
    pub amenities: Amenities,
    pub available_seats: i32,
}

impl From<&RideRecord> for RidePreview {
    fn from(record: &RideRecord) -> Self {
        let ride = &record.ride;
        Self {
            ride_id: ride.id.clone(),
            kind: ride.kind,
            ride_type: ride.schedule,
            recurrence: ride.recurrence.clone(),
            departure_time: ride.departure_time,
            arrival_time: ride.arrival_time,
            duration_minutes: ride.duration_minutes,
            origin: ride.origin.clone(),
            destination: ride.destination.clone(),
            price: ride.price.clone(),
            driver: record.driver.as_ref().map(DriverSummary::from),
            amenities: ride.amenities.clone().unwrap_or_default(),
            available_seats: ride.available_seats,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RideDetail {
    #[serde(flatten)]
    pub preview: RidePreview,
    pub total_seats: i32,
    pub status: crate::ride::RideStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stops: Vec<Stop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleSummary>,
    pub booking_policies: BookingPolicies,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&RideRecord> for RideDetail {
    fn from(record: &RideRecord) -> Self {
        let ride = &record.ride;
        Self {
            preview: RidePreview::from(record),
            total_seats: ride.total_seats,
            status: ride.status,
            stops: ride.stops.clone(),
            vehicle: record.vehicle.as_ref().map(VehicleSummary::from),
            booking_policies: BookingPolicies {
                instant_confirmation: ride.instant_confirmation,
                cancellation_policy: ride.cancellation_policy.clone(),
            },
            description: ride.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRidesResponse {
    pub total_count: usize,
    pub carpool_count: usize,
    pub bus_count: usize,
    pub rides: Vec<RidePreview>,
}

impl SearchRidesResponse {
    pub fn from_records(records: &[RideRecord]) -> Self {
        let mut carpool_count = 0;
        let mut bus_count = 0;
        let mut rides = Vec::with_capacity(records.len());

        for record in records {
            match record.ride.kind {
                RideKind::Carpool => carpool_count += 1,
                RideKind::Bus => bus_count += 1,
            }
            rides.push(RidePreview::from(record));
        }

        Self {
            total_count: rides.len(),
            carpool_count,
            bus_count,
            rides,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CityRef {
    pub city: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RideSummary {
    pub ride_id: String,
    pub departure_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<DateTime<Utc>>,
    pub origin: CityRef,
    pub destination: CityRef,
}

impl From<&Ride> for RideSummary {
    fn from(ride: &Ride) -> Self {
        Self {
            ride_id: ride.id.clone(),
            departure_time: ride.departure_time,
            arrival_time: ride.arrival_time,
            origin: CityRef { city: ride.origin.city.clone() },
            destination: CityRef { city: ride.destination.city.clone() },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingResponse {
    pub booking_id: String,
    pub ride_id: String,
    pub status: BookingStatus,
    pub passenger_count: i32,
    pub total_price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_response_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    pub ride_details: RideSummary,
}

impl BookingResponse {
    pub fn new(booking: &Booking, ride: &Ride) -> Self {
        Self {
            booking_id: booking.id.clone(),
            ride_id: booking.ride_id.clone(),
            status: booking.status,
            passenger_count: booking.passenger_count,
            total_price: booking.total_price.clone(),
            message: booking.message.clone(),
            driver_response_message: booking.driver_response_message.clone(),
            created_at: booking.created_at,
            responded_at: booking.responded_at,
            ride_details: RideSummary::from(ride),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserVerification {
    pub is_verified: bool,
    pub verified_id: bool,
    pub confirmed_email: bool,
    pub confirmed_phone: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserStats {
    pub published_rides: i32,
    pub completed_rides: i32,
    pub never_cancels: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub experience_level: String,
    pub rating: f64,
    pub rating_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driving_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    pub verification: UserVerification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub preferences: UserPreferences,
    pub membership_type: String,
    pub stats: UserStats,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            age: user.age,
            experience_level: user.experience_level.clone(),
            rating: user.rating,
            rating_count: user.rating_count,
            driving_rating: user.driving_rating.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
            verification: UserVerification {
                is_verified: user.is_verified,
                verified_id: user.verified_id,
                confirmed_email: user.confirmed_email,
                confirmed_phone: user.confirmed_phone,
            },
            bio: user.bio.clone(),
            preferences: user.preferences.clone().unwrap_or_default(),
            membership_type: user.membership_type.clone(),
            stats: UserStats {
                published_rides: user.published_rides,
                completed_rides: user.completed_rides,
                never_cancels: user.never_cancels,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ride::RideStatus;
    use chrono::TimeZone;

    fn ride(id: &str, kind: RideKind) -> Ride {
        let departure = Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap();
        Ride {
            id: id.to_string(),
            driver_id: "user_driver".to_string(),
            vehicle_id: None,
            kind,
            schedule: RideSchedule::OneTime,
            recurrence: None,
            departure_time: departure,
            arrival_time: None,
            duration_minutes: None,
            origin: Location { city: "Jakarta".to_string(), address: "Blok M".to_string(), location_point: None },
            destination: Location { city: "Bandung".to_string(), address: "Dago".to_string(), location_point: None },
            price: Price { amount: 80_000, currency: "IDR".to_string() },
            available_seats: 3,
            total_seats: 4,
            amenities: None,
            stops: Vec::new(),
            instant_confirmation: true,
            cancellation_policy: "never_cancels".to_string(),
            description: None,
            status: RideStatus::Active,
            created_at: departure,
            updated_at: departure,
        }
    }

    fn record(ride: Ride) -> RideRecord {
        RideRecord { ride, driver: None, vehicle: None }
    }

    #[test]
    fn test_search_counts_by_type() {
        let records = vec![
            record(ride("ride_a", RideKind::Carpool)),
            record(ride("ride_b", RideKind::Bus)),
            record(ride("ride_c", RideKind::Carpool)),
        ];
        let response = SearchRidesResponse::from_records(&records);
        assert_eq!(response.total_count, 3);
        assert_eq!(response.carpool_count, 2);
        assert_eq!(response.bus_count, 1);
        assert_eq!(response.rides[1].ride_id, "ride_b");
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let preview = RidePreview::from(&record(ride("ride_a", RideKind::Carpool)));
        let json = serde_json::to_value(&preview).unwrap();
        assert!(json.get("arrival_time").is_none());
        assert!(json.get("recurrence").is_none());
        assert!(json.get("driver").is_none());
        assert_eq!(json["type"], "carpool");
        assert_eq!(json["ride_type"], "one_time");
        assert_eq!(json["amenities"]["smoking_allowed"], false);
    }

    #[test]
    fn test_detail_flattens_preview_and_policies() {
        let mut r = record(ride("ride_a", RideKind::Bus));
        r.vehicle = Some(Vehicle {
            id: "vehicle_1".to_string(),
            user_id: "user_driver".to_string(),
            make: "Toyota".to_string(),
            model: "Avanza".to_string(),
            color: "Silver".to_string(),
            license_plate: None,
            year: None,
        });
        let json = serde_json::to_value(RideDetail::from(&r)).unwrap();
        assert_eq!(json["ride_id"], "ride_a");
        assert_eq!(json["vehicle"]["model"], "Avanza");
        assert_eq!(json["booking_policies"]["cancellation_policy"], "never_cancels");
        assert!(json.get("stops").is_none());
    }

    #[test]
    fn test_profile_defaults_preferences() {
        let mut user = User::new("user_1", "Rina", "rina@example.com");
        user.age = Some(29);
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert_eq!(json["age"], 29);
        assert_eq!(json["preferences"]["pets"], false);
        assert!(json.get("bio").is_none());
        assert!(json.get("email").is_none());
        assert_eq!(json["stats"]["never_cancels"], true);
    }
}
