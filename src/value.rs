//! Key/value canonicalization
//!
//! Everything written to the data file is a UTF-8 string. Callers hand the
//! engine a [`Datum`], which is converted to its canonical string form here
//! before the record codec sees it.
//!
//! | Datum     | key | value | canonical form                          |
//! |-----------|-----|-------|-----------------------------------------|
//! | `Text`    | yes | yes   | as-is                                   |
//! | `Integer` | yes | yes   | decimal                                 |
//! | `Float`   | no  | yes   | shortest decimal, `3.0` keeps its `.0`, |
//! |           |     |       | `1e+20` beyond 16 digits                |
//! | `Bytes`   | yes | yes   | UTF-8 if valid, else lowercase hex      |

use std::fmt::Write;

use crate::error::{DriftError, Result};

/// A key or value as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Text(String),
    Integer(i128),
    Float(f64),
    Bytes(Vec<u8>),
}

impl Datum {
    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Text(_) => "text",
            Datum::Integer(_) => "integer",
            Datum::Float(_) => "float",
            Datum::Bytes(_) => "bytes",
        }
    }

    /// Convert to the string stored on disk. Total over every variant.
    pub fn to_canonical_string(&self) -> String {
        match self {
            Datum::Text(s) => s.clone(),
            Datum::Integer(i) => i.to_string(),
            Datum::Float(f) => format_float(*f),
            Datum::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => s.to_string(),
                Err(_) => to_hex(b),
            },
        }
    }
}

/// Shortest round-trip digits. Decimal exponents below -4 or from 16 up
/// switch to scientific form with a signed two-digit exponent (`1e+20`,
/// `1.5e-07`); everything else is positional and keeps a fractional part.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{:e}", f);
    if let Some((mantissa, exp)) = sci.split_once('e') {
        if let Ok(exp) = exp.parse::<i32>() {
            if !(-4..16).contains(&exp) {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{}e{}{:02}", mantissa, sign, exp.abs());
            }
        }
    }

    let mut s = f.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}

// =============================================================================
// Boundary Conversions
// =============================================================================

/// Canonicalize a key. Floats are not accepted as keys.
pub fn canonical_key(key: &Datum) -> Result<String> {
    match key {
        Datum::Float(_) => Err(DriftError::UnsupportedType {
            kind: key.kind(),
            role: "key",
        }),
        _ => Ok(key.to_canonical_string()),
    }
}

/// Canonicalize a value. Every variant is a valid value.
pub fn canonical_value(value: &Datum) -> String {
    value.to_canonical_string()
}

/// Pre-check a key/value pair before it reaches the engine.
///
/// Returns false for unsupported key kinds and for keys that are empty once
/// canonicalized.
pub fn validate(key: &Datum, _value: &Datum) -> bool {
    match canonical_key(key) {
        Ok(k) => !k.is_empty(),
        Err(_) => false,
    }
}

// =============================================================================
// From Impls
// =============================================================================

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Text(s)
    }
}

impl From<&String> for Datum {
    fn from(s: &String) -> Self {
        Datum::Text(s.clone())
    }
}

impl From<Vec<u8>> for Datum {
    fn from(b: Vec<u8>) -> Self {
        Datum::Bytes(b)
    }
}

impl From<&[u8]> for Datum {
    fn from(b: &[u8]) -> Self {
        Datum::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Datum {
    fn from(b: &[u8; N]) -> Self {
        Datum::Bytes(b.to_vec())
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Self {
        Datum::Float(f)
    }
}

impl From<f32> for Datum {
    fn from(f: f32) -> Self {
        Datum::Float(f as f64)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Datum {
                fn from(i: $t) -> Self {
                    Datum::Integer(i as i128)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
