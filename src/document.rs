//! The persisted measurement document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized sensor reading as stored, keyed by the content digest of
/// its (device, timestamp) pair.
///
/// Optional fields are omitted from the serialized document when absent:
/// the store never sees a null, absence itself encodes "unknown". A
/// document is constructed once at normalization time and never updated;
/// a repeated write of the same logical reading is rejected by the unique
/// `_id` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Content digest of (device, integer-second timestamp); see
    /// [`crate::identity::build_id`].
    #[serde(rename = "_id")]
    pub id: String,

    /// Device identifier; `"unknown"` when the source row had none.
    pub device: String,

    /// Reading instant, truncated to whole seconds, stored as a BSON
    /// datetime.
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoke: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lpg: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<bool>,

    /// Unmapped source columns, present only when the preserve-raw option
    /// is on and at least one non-empty value exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<BTreeMap<String, String>>,
}
