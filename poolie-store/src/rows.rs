//! Row structs for the postgres repositories and their conversion into domain types.
//!
//! Enum columns are stored as text and JSONB columns are decoded here, once, into the typed
//! structures of `poolie_core`.

use chrono::{DateTime, Utc};
use poolie_core::repository::RepoResult;
use poolie_core::ride::{Amenities, Location, Price, Recurrence, Stop};
use poolie_core::user::UserPreferences;
use poolie_core::{Booking, Ride, User, Vehicle};
use poolie_shared::Masked;
use sqlx::types::Json;

pub(crate) const RIDE_COLUMNS: &str = "id, driver_id, vehicle_id, type, ride_type, recurrence, departure_time, \
     arrival_time, duration_minutes, origin_city, origin_address, origin_location_point, destination_city, \
     destination_address, destination_location_point, price_amount, price_currency, available_seats, total_seats, \
     amenities, stops, instant_confirmation, cancellation_policy, description, status, created_at, updated_at";

pub(crate) const USER_COLUMNS: &str = "id, name, email, phone, age, experience_level, rating, rating_count, \
     driving_rating, profile_picture_url, is_verified, verified_id, confirmed_email, confirmed_phone, bio, \
     preferences, membership_type, published_rides, completed_rides, never_cancels, created_at, updated_at";

pub(crate) const VEHICLE_COLUMNS: &str = "id, user_id, make, model, color, license_plate, year";

pub(crate) const BOOKING_COLUMNS: &str = "id, ride_id, passenger_id, status, passenger_count, total_price_amount, \
     total_price_currency, message, driver_response_message, created_at, responded_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct RideRow {
    pub id: String,
    pub driver_id: String,
    pub vehicle_id: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub ride_type: String,
    pub recurrence: Option<Json<Recurrence>>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub origin_city: String,
    pub origin_address: String,
    pub origin_location_point: Option<String>,
    pub destination_city: String,
    pub destination_address: String,
    pub destination_location_point: Option<String>,
    pub price_amount: i64,
    pub price_currency: String,
    pub available_seats: i32,
    pub total_seats: i32,
    pub amenities: Option<Json<Amenities>>,
    pub stops: Json<Vec<Stop>>,
    pub instant_confirmation: bool,
    pub cancellation_policy: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRow {
    pub fn into_ride(self) -> RepoResult<Ride> {
        Ok(Ride {
            id: self.id,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            kind: self.kind.parse()?,
            schedule: self.ride_type.parse()?,
            recurrence: self.recurrence.map(|json| json.0),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            duration_minutes: self.duration_minutes,
            origin: Location {
                city: self.origin_city,
                address: self.origin_address,
                location_point: self.origin_location_point,
            },
            destination: Location {
                city: self.destination_city,
                address: self.destination_address,
                location_point: self.destination_location_point,
            },
            price: Price {
                amount: self.price_amount,
                currency: self.price_currency,
            },
            available_seats: self.available_seats,
            total_seats: self.total_seats,
            amenities: self.amenities.map(|json| json.0),
            stops: self.stops.0,
            instant_confirmation: self.instant_confirmation,
            cancellation_policy: self.cancellation_policy,
            description: self.description,
            status: self.status.parse()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub experience_level: String,
    pub rating: f64,
    pub rating_count: i32,
    pub driving_rating: Option<String>,
    pub profile_picture_url: Option<String>,
    pub is_verified: bool,
    pub verified_id: bool,
    pub confirmed_email: bool,
    pub confirmed_phone: bool,
    pub bio: Option<String>,
    pub preferences: Option<Json<UserPreferences>>,
    pub membership_type: String,
    pub published_rides: i32,
    pub completed_rides: i32,
    pub never_cancels: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: Masked(row.email),
            phone: row.phone.map(Masked),
            age: row.age,
            experience_level: row.experience_level,
            rating: row.rating,
            rating_count: row.rating_count,
            driving_rating: row.driving_rating,
            profile_picture_url: row.profile_picture_url,
            is_verified: row.is_verified,
            verified_id: row.verified_id,
            confirmed_email: row.confirmed_email,
            confirmed_phone: row.confirmed_phone,
            bio: row.bio,
            preferences: row.preferences.map(|json| json.0),
            membership_type: row.membership_type,
            published_rides: row.published_rides,
            completed_rides: row.completed_rides,
            never_cancels: row.never_cancels,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct VehicleRow {
    pub id: String,
    pub user_id: String,
    pub make: String,
    pub model: String,
    pub color: String,
    pub license_plate: Option<String>,
    pub year: Option<i32>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: row.id,
            user_id: row.user_id,
            make: row.make,
            model: row.model,
            color: row.color,
            license_plate: row.license_plate,
            year: row.year,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: String,
    pub ride_id: String,
    pub passenger_id: String,
    pub status: String,
    pub passenger_count: i32,
    pub total_price_amount: i64,
    pub total_price_currency: String,
    pub message: Option<String>,
    pub driver_response_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRow {
    pub fn into_booking(self) -> RepoResult<Booking> {
        Ok(Booking {
            id: self.id,
            ride_id: self.ride_id,
            passenger_id: self.passenger_id,
            status: self.status.parse()?,
            passenger_count: self.passenger_count,
            total_price: Price {
                amount: self.total_price_amount,
                currency: self.total_price_currency,
            },
            message: self.message,
            driver_response_message: self.driver_response_message,
            created_at: self.created_at,
            responded_at: self.responded_at,
            updated_at: self.updated_at,
        })
    }
}
