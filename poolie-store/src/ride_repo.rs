use std::collections::HashMap;

use async_trait::async_trait;
use poolie_core::repository::{RepoResult, RideRecord, RideRepository, SeatUpdate};
use poolie_core::search::{RideSearchQuery, TypeFilter};
use poolie_core::{Ride, User, Vehicle};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::rows::{RideRow, UserRow, VehicleRow, RIDE_COLUMNS, USER_COLUMNS, VEHICLE_COLUMNS};

pub struct PostgresRideRepository {
    pool: PgPool,
}

impl PostgresRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach drivers and vehicles to a batch of rides with one query per table.
    async fn hydrate(&self, rides: Vec<Ride>) -> RepoResult<Vec<RideRecord>> {
        if rides.is_empty() {
            return Ok(Vec::new());
        }

        let driver_ids: Vec<String> = rides.iter().map(|r| r.driver_id.clone()).collect();
        let vehicle_ids: Vec<String> = rides.iter().filter_map(|r| r.vehicle_id.clone()).collect();

        let drivers: HashMap<String, User> = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(&driver_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| (row.id.clone(), User::from(row)))
        .collect();

        let vehicles: HashMap<String, Vehicle> = if vehicle_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, VehicleRow>(&format!(
                "SELECT {} FROM vehicles WHERE id = ANY($1)",
                VEHICLE_COLUMNS
            ))
            .bind(&vehicle_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.id.clone(), Vehicle::from(row)))
            .collect()
        };

        Ok(rides
            .into_iter()
            .map(|ride| RideRecord {
                driver: drivers.get(&ride.driver_id).cloned(),
                vehicle: ride.vehicle_id.as_ref().and_then(|id| vehicles.get(id)).cloned(),
                ride,
            })
            .collect())
    }
}

/// Conditional decrement on an open connection or transaction.
///
/// The row lock taken by the `UPDATE` makes concurrent decrements on one ride serialise; the
/// `available_seats >= $2` guard is re-evaluated against the latest committed row.
pub(crate) async fn decrement_seats(conn: &mut PgConnection, ride_id: &str, seats: i32) -> RepoResult<SeatUpdate> {
    let updated = sqlx::query_as::<_, RideRow>(&format!(
        "UPDATE rides SET available_seats = available_seats - $2, updated_at = NOW() \
         WHERE id = $1 AND available_seats >= $2 RETURNING {}",
        RIDE_COLUMNS
    ))
    .bind(ride_id)
    .bind(seats)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = updated {
        return Ok(SeatUpdate::Applied(row.into_ride()?));
    }

    let available: Option<i32> = sqlx::query_scalar("SELECT available_seats FROM rides WHERE id = $1")
        .bind(ride_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(match available {
        Some(available) => SeatUpdate::Insufficient { available },
        None => SeatUpdate::RideNotFound,
    })
}

#[async_trait]
impl RideRepository for PostgresRideRepository {
    async fn get_ride(&self, id: &str) -> RepoResult<Option<RideRecord>> {
        let row = sqlx::query_as::<_, RideRow>(&format!("SELECT {} FROM rides WHERE id = $1", RIDE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row.into_ride()?]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn search_rides(&self, query: &RideSearchQuery) -> RepoResult<Vec<RideRecord>> {
        let (start, end) = query.departure_window();
        let kind = match query.kind {
            TypeFilter::All => None,
            TypeFilter::Only(kind) => Some(kind.as_str()),
        };

        // strpos keeps the match a case-sensitive substring test, with no LIKE wildcards
        let rows = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {} FROM rides \
             WHERE status = 'active' \
               AND strpos(origin_city, $1) > 0 \
               AND strpos(destination_city, $2) > 0 \
               AND departure_time >= $3 AND departure_time < $4 \
               AND ($5::text IS NULL OR type = $5) \
               AND ($6::int IS NULL OR available_seats >= $6) \
             ORDER BY departure_time ASC, id ASC",
            RIDE_COLUMNS
        ))
        .bind(&query.origin)
        .bind(&query.destination)
        .bind(start)
        .bind(end)
        .bind(kind)
        .bind(query.min_seats)
        .fetch_all(&self.pool)
        .await?;

        let rides = rows.into_iter().map(RideRow::into_ride).collect::<RepoResult<Vec<_>>>()?;
        self.hydrate(rides).await
    }

    async fn insert_ride(&self, ride: &Ride, vehicle: Option<&Vehicle>) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(vehicle) = vehicle {
            sqlx::query(
                r#"
                INSERT INTO vehicles (id, user_id, make, model, color, license_plate, year)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&vehicle.id)
            .bind(&vehicle.user_id)
            .bind(&vehicle.make)
            .bind(&vehicle.model)
            .bind(&vehicle.color)
            .bind(&vehicle.license_plate)
            .bind(vehicle.year)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO rides (
                id, driver_id, vehicle_id, type, ride_type, recurrence, departure_time, arrival_time,
                duration_minutes, origin_city, origin_address, origin_location_point, destination_city,
                destination_address, destination_location_point, price_amount, price_currency,
                available_seats, total_seats, amenities, stops, instant_confirmation, cancellation_policy,
                description, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19,
                    $20, $21, $22, $23, $24, $25, $26, $27)
            "#,
        )
        .bind(&ride.id)
        .bind(&ride.driver_id)
        .bind(&ride.vehicle_id)
        .bind(ride.kind.as_str())
        .bind(ride.schedule.as_str())
        .bind(ride.recurrence.clone().map(Json))
        .bind(ride.departure_time)
        .bind(ride.arrival_time)
        .bind(ride.duration_minutes)
        .bind(&ride.origin.city)
        .bind(&ride.origin.address)
        .bind(&ride.origin.location_point)
        .bind(&ride.destination.city)
        .bind(&ride.destination.address)
        .bind(&ride.destination.location_point)
        .bind(ride.price.amount)
        .bind(&ride.price.currency)
        .bind(ride.available_seats)
        .bind(ride.total_seats)
        .bind(ride.amenities.clone().map(Json))
        .bind(Json(ride.stops.clone()))
        .bind(ride.instant_confirmation)
        .bind(&ride.cancellation_policy)
        .bind(&ride.description)
        .bind(ride.status.as_str())
        .bind(ride.created_at)
        .bind(ride.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn decrement_available_seats(&self, ride_id: &str, seats: i32) -> RepoResult<SeatUpdate> {
        let mut conn = self.pool.acquire().await?;
        decrement_seats(&mut conn, ride_id, seats).await
    }
}
