//! Key-press data models.
//!
//! `KeyPressRecord` is the durable per-key row; `KeyPressDelta` is the
//! ephemeral unit a flush batch is made of.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPressRecord {
    pub key_code: i64,
    pub key_name: String,
    pub count: u64,
}

/// Accumulated presses for one key since the last successful flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPressDelta {
    pub key_code: i64,
    pub key_name: String,
    pub delta: u32,
}
