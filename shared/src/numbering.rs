//! Batch and return invoice numbering
//!
//! Distribution batches are numbered `DIST-{YYYYMMDD}-{STORECODE}-{seq}` and
//! store returns `RET-{YYYYMMDD}-{seq}`. Sequences are scoped to the prefix,
//! so every (store, date) pair counts from 1. A number is never handed out
//! twice, even after the batch that carried it is deleted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DISTRIBUTION_PREFIX: &str = "DIST";
pub const RETURN_PREFIX: &str = "RET";
pub const LEGACY_PREFIX: &str = "LEGACY";

/// Width of the zero-padded sequence suffix
pub const SEQUENCE_WIDTH: usize = 4;

/// How new batch ids are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingStrategy {
    /// Per-prefix counter
    #[default]
    Sequential,
    /// Four random hex characters, collision-checked by the caller
    Random,
}

/// Upper-case ASCII alphanumerics only; empty codes become `STORE`
pub fn normalize_store_code(code: &str) -> String {
    let cleaned: String = code
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if cleaned.is_empty() {
        "STORE".to_string()
    } else {
        cleaned
    }
}

/// `DIST-20240301-STOREA`
pub fn batch_prefix(date: NaiveDate, store_code: &str) -> String {
    format!(
        "{}-{}-{}",
        DISTRIBUTION_PREFIX,
        date.format("%Y%m%d"),
        normalize_store_code(store_code)
    )
}

/// `RET-20240301`
pub fn return_prefix(date: NaiveDate) -> String {
    format!("{}-{}", RETURN_PREFIX, date.format("%Y%m%d"))
}

pub fn format_sequence_id(prefix: &str, sequence: u32) -> String {
    format!("{}-{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH)
}

/// Random-suffix id built from caller-supplied entropy
pub fn random_batch_id(prefix: &str, entropy: u128) -> String {
    format!("{}-{:04X}", prefix, (entropy & 0xFFFF) as u16)
}

/// Display label for batches stored without a number
pub fn derived_batch_label(date: NaiveDate, distributed_by: Uuid, store_id: Uuid) -> String {
    let short = |id: Uuid| id.simple().to_string()[..8].to_uppercase();
    format!(
        "{}-{}-{}-{}",
        LEGACY_PREFIX,
        date.format("%Y%m%d"),
        short(distributed_by),
        short(store_id)
    )
}
