use async_trait::async_trait;
use poolie_core::repository::{BookingRepository, BookingTransition, RepoResult, SeatUpdate, TransitionOutcome};
use poolie_core::{Booking, BookingStatus};
use sqlx::PgPool;
use tracing::debug;

use crate::ride_repo::decrement_seats;
use crate::rows::{BookingRow, BOOKING_COLUMNS};

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, ride_id, passenger_id, status, passenger_count, total_price_amount, total_price_currency,
                message, driver_response_message, created_at, responded_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.ride_id)
        .bind(&booking.passenger_id)
        .bind(booking.status.as_str())
        .bind(booking.passenger_count)
        .bind(booking.total_price.amount)
        .bind(&booking.total_price.currency)
        .bind(&booking.message)
        .bind(&booking.driver_response_message)
        .bind(booking.created_at)
        .bind(booking.responded_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_booking(&self, id: &str) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn apply_transition(&self, transition: &BookingTransition) -> RepoResult<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        // 1. Leave pending, at most once
        let updated = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $2, responded_at = $3, driver_response_message = $4, updated_at = $3 \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(&transition.booking_id)
        .bind(transition.to.as_str())
        .bind(transition.responded_at)
        .bind(&transition.driver_response_message)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            let current: Option<String> = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
                .bind(&transition.booking_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            return Ok(match current {
                Some(status) => TransitionOutcome::NotPending { current: status.parse::<BookingStatus>()? },
                None => TransitionOutcome::BookingNotFound,
            });
        };

        // 2. Seats, in the same transaction
        let ride = match &transition.seat_decrement {
            Some(decrement) => match decrement_seats(&mut tx, &decrement.ride_id, decrement.seats).await? {
                SeatUpdate::Applied(ride) => Some(ride),
                SeatUpdate::Insufficient { available } => {
                    tx.rollback().await?;
                    debug!("Rolled back transition of {}: {} seats left", transition.booking_id, available);
                    return Ok(TransitionOutcome::Insufficient { available });
                }
                SeatUpdate::RideNotFound => {
                    tx.rollback().await?;
                    return Ok(TransitionOutcome::RideNotFound);
                }
            },
            None => None,
        };

        tx.commit().await?;

        Ok(TransitionOutcome::Applied {
            booking: row.into_booking()?,
            ride,
        })
    }
}
