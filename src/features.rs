#[cfg(any(feature = "chrono", feature = "smol_str"))]
use std::any::type_name;

#[cfg(feature = "chrono")]
use chrono::{DateTime, Local, NaiveDateTime, Utc};
#[cfg(feature = "smol_str")]
use smol_str::SmolStr;

#[cfg(feature = "chrono")]
use crate::primitive::{ticks_from_unix, unix_from_ticks};
#[cfg(any(feature = "chrono", feature = "smol_str"))]
use crate::*;

/// Ticks of a Unix timestamp, saturated to the `i64` range.
///
/// Only dates more than ~29,000 years away from year 1 saturate.
#[cfg(feature = "chrono")]
fn saturating_ticks(seconds: i64, nanos: u32) -> i64 {
    ticks_from_unix(seconds, nanos).unwrap_or(if seconds < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(feature = "chrono")]
fn utc_from_value<T: Schema>(value: Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Timestamp(ticks) => {
            let (seconds, nanos) = unix_from_ticks(ticks);
            DateTime::from_timestamp(seconds, nanos)
                .ok_or_else(|| MalformedError::TimestampRange { ticks }.into())
        }
        other => Err(other.mismatch(T::descriptor())),
    }
}

// --- DateTime<Utc> ---
/// Encodes a `chrono::DateTime<Utc>` as 100 ns ticks since 0001-01-01T00:00:00Z.
/// Nanoseconds below the tick resolution are truncated.
#[cfg(feature = "chrono")]
impl Schema for DateTime<Utc> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::timestamp(type_name::<Self>())
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(saturating_ticks(
            self.timestamp(),
            self.timestamp_subsec_nanos(),
        ))
    }

    fn from_value(value: Value) -> Result<Self> {
        utc_from_value::<Self>(value)
    }
}

// --- DateTime<Local> ---
/// Stored as the UTC instant; decoded back into the local offset of the reading process.
#[cfg(feature = "chrono")]
impl Schema for DateTime<Local> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::timestamp(type_name::<Self>())
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(saturating_ticks(
            self.timestamp(),
            self.timestamp_subsec_nanos(),
        ))
    }

    fn from_value(value: Value) -> Result<Self> {
        utc_from_value::<Self>(value).map(|utc| utc.with_timezone(&Local))
    }
}

// --- NaiveDateTime ---
/// A wall-clock time, stored as if it were UTC.
#[cfg(feature = "chrono")]
impl Schema for NaiveDateTime {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::timestamp(type_name::<Self>())
    }

    fn to_value(&self) -> Value {
        self.and_utc().to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        utc_from_value::<Self>(value).map(|utc| utc.naive_utc())
    }
}

// --- SmolStr ---
#[cfg(feature = "smol_str")]
impl Schema for SmolStr {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::string(type_name::<Self>())
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(SmolStr::from(text)),
            other => Err(other.mismatch(Self::descriptor())),
        }
    }
}
