//! Bit-exact encoding of fixed-width scalars.
//!
//! Every kind has a fixed wire width and is little-endian. Each kind has its own hand-written
//! conversion; nothing relies on the in-memory layout of the host.

use rust_decimal::Decimal;

use crate::schema::ScalarKind;
use crate::value::Scalar;
use crate::{MalformedError, Result};

/// Width of the widest scalar (decimal, i128, u128). Sizes the shared scratch buffers.
pub const MAX_SCALAR_WIDTH: usize = 16;

/// Width of the `i32` length/count prefix of strings and collections.
pub const LENGTH_WIDTH: usize = 4;

/// Width of a timestamp, encoded as `i64` ticks.
pub const TIMESTAMP_WIDTH: usize = 8;

/// Ticks per second; one tick is 100 ns.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks from 0001-01-01T00:00:00Z to the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const DECIMAL_SIGN_MASK: u32 = 0x8000_0000;
const DECIMAL_SCALE_MASK: u32 = 0x00FF_0000;
const DECIMAL_SCALE_SHIFT: u32 = 16;
const DECIMAL_MAX_SCALE: u32 = 28;

impl ScalarKind {
    /// The fixed wire width of this kind in bytes.
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 | ScalarKind::Char => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
            ScalarKind::I128 | ScalarKind::U128 | ScalarKind::Decimal => 16,
        }
    }
}

/// Writes the scalar into the front of `out` and returns the number of bytes used.
pub fn encode_scalar(scalar: &Scalar, out: &mut [u8; MAX_SCALAR_WIDTH]) -> usize {
    match *scalar {
        Scalar::Bool(v) => put(out, &[u8::from(v)]),
        Scalar::U8(v) => put(out, &[v]),
        Scalar::I8(v) => put(out, &v.to_le_bytes()),
        Scalar::I16(v) => put(out, &v.to_le_bytes()),
        Scalar::U16(v) => put(out, &v.to_le_bytes()),
        Scalar::I32(v) => put(out, &v.to_le_bytes()),
        Scalar::U32(v) => put(out, &v.to_le_bytes()),
        Scalar::I64(v) => put(out, &v.to_le_bytes()),
        Scalar::U64(v) => put(out, &v.to_le_bytes()),
        Scalar::I128(v) => put(out, &v.to_le_bytes()),
        Scalar::U128(v) => put(out, &v.to_le_bytes()),
        Scalar::F32(v) => put(out, &v.to_le_bytes()),
        Scalar::F64(v) => put(out, &v.to_le_bytes()),
        Scalar::Char(v) => put(out, &u32::from(v).to_le_bytes()),
        Scalar::Decimal(v) => {
            for (chunk, word) in out.chunks_exact_mut(4).zip(decimal_to_words(&v)) {
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            MAX_SCALAR_WIDTH
        }
    }
}

#[inline]
fn put(out: &mut [u8; MAX_SCALAR_WIDTH], bytes: &[u8]) -> usize {
    out[..bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

/// Reads a scalar of `kind` from exactly `kind.width()` bytes.
///
/// # Errors
/// Returns `MalformedError::InsufficientData` if `bytes` is shorter than the width, and
/// `MalformedError::InvalidScalar` for bytes that are not a valid value of the kind.
pub fn decode_scalar(kind: ScalarKind, bytes: &[u8]) -> Result<Scalar> {
    let width = kind.width();
    if bytes.len() < width {
        return Err(MalformedError::InsufficientData {
            needed: width - bytes.len(),
        }
        .into());
    }
    let scalar = match kind {
        ScalarKind::Bool => match bytes[0] {
            0 => Scalar::Bool(false),
            1 => Scalar::Bool(true),
            other => {
                return Err(invalid(kind, format!("expected 0 or 1, got {}", other)));
            }
        },
        ScalarKind::U8 => Scalar::U8(bytes[0]),
        ScalarKind::I8 => Scalar::I8(i8::from_le_bytes(array(bytes))),
        ScalarKind::I16 => Scalar::I16(i16::from_le_bytes(array(bytes))),
        ScalarKind::U16 => Scalar::U16(u16::from_le_bytes(array(bytes))),
        ScalarKind::I32 => Scalar::I32(i32::from_le_bytes(array(bytes))),
        ScalarKind::U32 => Scalar::U32(u32::from_le_bytes(array(bytes))),
        ScalarKind::I64 => Scalar::I64(i64::from_le_bytes(array(bytes))),
        ScalarKind::U64 => Scalar::U64(u64::from_le_bytes(array(bytes))),
        ScalarKind::I128 => Scalar::I128(i128::from_le_bytes(array(bytes))),
        ScalarKind::U128 => Scalar::U128(u128::from_le_bytes(array(bytes))),
        ScalarKind::F32 => Scalar::F32(f32::from_le_bytes(array(bytes))),
        ScalarKind::F64 => Scalar::F64(f64::from_le_bytes(array(bytes))),
        ScalarKind::Char => {
            let code = u32::from_le_bytes(array(bytes));
            let ch = char::from_u32(code).ok_or_else(|| {
                invalid(kind, format!("0x{:08X} is not a Unicode scalar value", code))
            })?;
            Scalar::Char(ch)
        }
        ScalarKind::Decimal => {
            let mut words = [0u32; 4];
            for (word, chunk) in words.iter_mut().zip(bytes[..width].chunks_exact(4)) {
                *word = u32::from_le_bytes(array(chunk));
            }
            Scalar::Decimal(decimal_from_words(words)?)
        }
    };
    Ok(scalar)
}

/// Copies the leading `N` bytes. Callers have checked the length against the kind's width.
#[inline]
fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn invalid(kind: ScalarKind, reason: String) -> crate::CodecError {
    MalformedError::InvalidScalar { kind, reason }.into()
}

/// Splits a decimal into `[low, mid, high, flags]`, where the first three words hold the
/// 96-bit unscaled magnitude and `flags` is `sign << 31 | scale << 16`.
pub fn decimal_to_words(value: &Decimal) -> [u32; 4] {
    let magnitude = value.mantissa().unsigned_abs();
    let mut flags = value.scale() << DECIMAL_SCALE_SHIFT;
    if value.is_sign_negative() {
        flags |= DECIMAL_SIGN_MASK;
    }
    [
        magnitude as u32,
        (magnitude >> 32) as u32,
        (magnitude >> 64) as u32,
        flags,
    ]
}

/// Rebuilds a decimal from `[low, mid, high, flags]`.
///
/// # Errors
/// Fails if the scale exceeds 28 or any reserved flag bit is set.
pub fn decimal_from_words(words: [u32; 4]) -> Result<Decimal> {
    let [lo, mid, hi, flags] = words;
    if flags & !(DECIMAL_SIGN_MASK | DECIMAL_SCALE_MASK) != 0 {
        return Err(invalid(
            ScalarKind::Decimal,
            format!("reserved flag bits set in 0x{:08X}", flags),
        ));
    }
    let scale = (flags & DECIMAL_SCALE_MASK) >> DECIMAL_SCALE_SHIFT;
    if scale > DECIMAL_MAX_SCALE {
        return Err(invalid(
            ScalarKind::Decimal,
            format!("scale {} exceeds {}", scale, DECIMAL_MAX_SCALE),
        ));
    }
    let negative = flags & DECIMAL_SIGN_MASK != 0;
    Ok(Decimal::from_parts(lo, mid, hi, negative, scale))
}

/// Converts seconds and nanoseconds since the Unix epoch into ticks.
///
/// Sub-tick nanoseconds are truncated. Returns `None` if the result does not fit in `i64`.
pub fn ticks_from_unix(seconds: i64, nanos: u32) -> Option<i64> {
    seconds
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(nanos / 100))?
        .checked_add(UNIX_EPOCH_TICKS)
}

/// Converts ticks back into seconds and nanoseconds since the Unix epoch.
pub fn unix_from_ticks(ticks: i64) -> (i64, u32) {
    let relative = i128::from(ticks) - i128::from(UNIX_EPOCH_TICKS);
    let seconds = relative.div_euclid(i128::from(TICKS_PER_SECOND));
    let nanos = relative.rem_euclid(i128::from(TICKS_PER_SECOND)) * 100;
    // |relative| < 2^64, so the quotient always fits in i64.
    (seconds as i64, nanos as u32)
}
