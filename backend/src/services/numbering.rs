//! Batch and return number allocation
//!
//! Allocation runs inside the caller's transaction. Sequential numbers come
//! from the `number_sequences` counter row for the prefix; the upsert locks
//! that row until the caller commits, so allocators for the same
//! (store, date) queue behind each other. Every number, sequential or random,
//! is also written to `issued_numbers`, which is never pruned, so deleting a
//! batch does not make its number available again.
//!
//! Counter rows are locked in the order allocations are made. Callers that
//! allocate for several stores in one unit go in ascending store id order.

use chrono::NaiveDate;
use shared::{batch_prefix, format_sequence_id, random_batch_id, return_prefix, NumberingStrategy};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger;

const RANDOM_ATTEMPTS: usize = 8;
const SEQUENCE_ATTEMPTS: usize = 32;

/// Allocate the id for a new batch destined for `store_id`
pub async fn next_batch_id(
    conn: &mut PgConnection,
    business_id: Uuid,
    store_id: Uuid,
    date: NaiveDate,
    strategy: NumberingStrategy,
) -> AppResult<String> {
    let store_code = ledger::ensure_store(conn, business_id, store_id).await?;
    let prefix = batch_prefix(date, &store_code);

    match strategy {
        NumberingStrategy::Sequential => next_sequential(conn, business_id, &prefix).await,
        NumberingStrategy::Random => {
            for _ in 0..RANDOM_ATTEMPTS {
                let candidate = random_batch_id(&prefix, Uuid::new_v4().as_u128());
                if register(conn, business_id, &candidate).await? {
                    return Ok(candidate);
                }
                tracing::debug!(candidate = %candidate, "Batch id collision, retrying");
            }
            Err(AppError::Internal(format!(
                "no free batch id under {} after {} attempts",
                prefix, RANDOM_ATTEMPTS
            )))
        }
    }
}

/// Allocate the next `RET-{date}-{seq}` number for the tenant
pub async fn next_return_number(
    conn: &mut PgConnection,
    business_id: Uuid,
    date: NaiveDate,
) -> AppResult<String> {
    next_sequential(conn, business_id, &return_prefix(date)).await
}

/// Bump the prefix counter until it lands on a number nobody holds.
///
/// Only a random id that happens to be all digits can be in the way.
async fn next_sequential(conn: &mut PgConnection, business_id: Uuid, prefix: &str) -> AppResult<String> {
    for _ in 0..SEQUENCE_ATTEMPTS {
        let sequence = bump_counter(conn, business_id, prefix).await?;
        let candidate = format_sequence_id(prefix, sequence);
        if register(conn, business_id, &candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!(candidate = %candidate, "Sequence number already issued, skipping");
    }
    Err(AppError::Internal(format!(
        "no free sequence number under {} after {} attempts",
        prefix, SEQUENCE_ATTEMPTS
    )))
}

async fn bump_counter(conn: &mut PgConnection, business_id: Uuid, prefix: &str) -> AppResult<u32> {
    let value = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO number_sequences (business_id, prefix, last_value)
        VALUES ($1, $2, 1)
        ON CONFLICT (business_id, prefix) DO UPDATE
        SET last_value = number_sequences.last_value + 1, updated_at = NOW()
        RETURNING last_value
        "#,
    )
    .bind(business_id)
    .bind(prefix)
    .fetch_one(&mut *conn)
    .await?;

    u32::try_from(value).map_err(|_| AppError::Internal(format!("counter for {} is {}", prefix, value)))
}

/// Claim `number` for good; false when it was issued before
async fn register(conn: &mut PgConnection, business_id: Uuid, number: &str) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO issued_numbers (business_id, number)
        VALUES ($1, $2)
        ON CONFLICT (business_id, number) DO NOTHING
        "#,
    )
    .bind(business_id)
    .bind(number)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
