//! Cell-level coercion of raw CSV text into typed values.
//!
//! Every function here is total: a value that cannot be coerced yields
//! `None`, never an error. Callers omit absent values from the stored
//! document entirely, so absence encodes "unknown" rather than null.

use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Unit of a numeric epoch timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpochUnit {
    /// Seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    Milliseconds,
    /// Decide per value: magnitude strictly above [`EPOCH_MILLIS_CUTOFF`]
    /// is taken as milliseconds, anything else as seconds.
    #[default]
    Auto,
}

impl FromStr for EpochUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "seconds" => Ok(Self::Seconds),
            "ms" | "milliseconds" => Ok(Self::Milliseconds),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown epoch unit '{other}' (expected s, ms or auto)")),
        }
    }
}

/// Magnitude separating second-scale from millisecond-scale epoch values
/// under [`EpochUnit::Auto`].
///
/// Fixed policy constant: values up to 1e12 are second-scale timestamps
/// (unambiguous until the year 33658), values above it are millisecond-scale
/// (anything from ~2001 onward).
pub const EPOCH_MILLIS_CUTOFF: f64 = 1.0e12;

/// Attempt a numeric parse of `raw`; any failure yields `None`.
pub fn coerce_float(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Tri-state boolean coercion.
///
/// Classification order:
///
/// 1. empty ⇒ `None`
/// 2. numeric (including numeric-looking strings) ⇒ nonzero is true
/// 3. case-insensitive truthy {"true","t","1","yes","y"} or falsy
///    {"false","f","0","no","n"} tokens
/// 4. anything else ⇒ `None`
pub fn coerce_bool(raw: &str) -> Option<bool> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(number) = value.parse::<f64>() {
        if number.is_nan() {
            return None;
        }
        return Some(number != 0.0);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a numeric epoch value into a UTC instant truncated to whole
/// seconds.
///
/// Rules:
///
/// - the value must parse as a finite number; anything else yields `None`
/// - an explicit unit is always honored; only [`EpochUnit::Auto`] consults
///   [`EPOCH_MILLIS_CUTOFF`]
/// - sub-second precision is discarded before any downstream use, so
///   re-ingesting the same logical reading converges on the same instant
///   regardless of jitter in the source formatting
pub fn parse_epoch_timestamp(raw: &str, unit: EpochUnit) -> Option<DateTime<Utc>> {
    let value = raw.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let seconds = match unit {
        EpochUnit::Seconds => value,
        EpochUnit::Milliseconds => value / 1000.0,
        EpochUnit::Auto if value.abs() > EPOCH_MILLIS_CUTOFF => value / 1000.0,
        EpochUnit::Auto => value,
    };
    DateTime::from_timestamp(seconds as i64, 0)
}
