//! Value encodings shared by the variable and array tables.
//!
//! Floats use the runtime's 5-byte format: one exponent byte biased by 128
//! (0 means the value is zero) followed by a 32-bit mantissa, high byte
//! first. The mantissa is normalised so its top bit is always 1; that bit is
//! not stored and holds the sign instead.

use crate::error::DecodeErrorKind;
use crate::name::VariableKind;

pub const FLOAT_LEN: usize = 5;

const EXPONENT_BIAS: i32 = 128;

/// Decode a 5-byte float
pub fn decode_float(bytes: &[u8; FLOAT_LEN]) -> f64 {
    let exponent = bytes[0];
    if exponent == 0 {
        return 0.0;
    }
    let negative = bytes[1] & 0x80 != 0;
    let mantissa = u32::from_be_bytes([bytes[1] | 0x80, bytes[2], bytes[3], bytes[4]]);
    let magnitude = mantissa as f64 * 2f64.powi(exponent as i32 - EXPONENT_BIAS - 32);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Encode a value the way the runtime would store it. Returns None for
/// values the format cannot hold exactly.
pub fn encode_float(value: f64) -> Option<[u8; FLOAT_LEN]> {
    if value == 0.0 {
        return Some([0; FLOAT_LEN]);
    }
    if !value.is_finite() {
        return None;
    }

    let bits = value.abs().to_bits();
    let ieee_exponent = ((bits >> 52) & 0x7ff) as i32;
    if ieee_exponent == 0 {
        // subnormal, far below the smallest representable value
        return None;
    }
    // 1.f * 2^(e - 1023) == 0.1f * 2^(e - 1022)
    let exponent = ieee_exponent - 1022 + EXPONENT_BIAS;
    if !(1..=255).contains(&exponent) {
        return None;
    }

    let significand = (1u64 << 52) | (bits & ((1u64 << 52) - 1));
    if significand & ((1u64 << 21) - 1) != 0 {
        return None;
    }
    let mantissa = ((significand >> 21) as u32).to_be_bytes();
    let sign = if value < 0.0 { 0x80 } else { 0x00 };

    Some([
        exponent as u8,
        (mantissa[0] & 0x7f) | sign,
        mantissa[1],
        mantissa[2],
        mantissa[3],
    ])
}

/// Integers are signed 16 bit, high byte first
pub fn decode_integer(bytes: [u8; 2]) -> i16 {
    i16::from_be_bytes(bytes)
}

/// Length and location of a string's characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringDescriptor {
    pub length: u8,
    pub pointer: u16,
}

impl StringDescriptor {
    pub fn decode(bytes: &[u8]) -> Result<StringDescriptor, DecodeErrorKind> {
        match bytes {
            [length, lo, hi, ..] => Ok(StringDescriptor {
                length: *length,
                pointer: u16::from_le_bytes([*lo, *hi]),
            }),
            _ => Err(DecodeErrorKind::TruncatedRecord {
                available: bytes.len(),
                needed: 3,
            }),
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let [lo, hi] = self.pointer.to_le_bytes();
        [self.length, lo, hi]
    }

    /// One past the last character
    pub fn end(&self) -> usize {
        self.pointer as usize + self.length as usize
    }
}

/// A DEF FN slot: where the definition lives in the program text and the
/// variable holding its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub definition: u16,
    pub argument: u16,
    pub extra: u8,
}

/// One decoded value. The variant always follows the owning name's kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Float(f64),
    Integer(i16),
    String(StringDescriptor),
    Function(FunctionDefinition),
}

impl ScalarValue {
    /// Decode a value of `kind` from the start of `bytes`
    pub fn decode(kind: VariableKind, bytes: &[u8]) -> Result<ScalarValue, DecodeErrorKind> {
        let needed = kind.value_size();
        if bytes.len() < needed {
            return Err(DecodeErrorKind::TruncatedRecord {
                available: bytes.len(),
                needed,
            });
        }
        let value = match kind {
            VariableKind::Float => {
                let mut raw = [0u8; FLOAT_LEN];
                raw.copy_from_slice(&bytes[..FLOAT_LEN]);
                ScalarValue::Float(decode_float(&raw))
            }
            VariableKind::Integer => ScalarValue::Integer(decode_integer([bytes[0], bytes[1]])),
            VariableKind::String => ScalarValue::String(StringDescriptor::decode(bytes)?),
            VariableKind::Function => ScalarValue::Function(FunctionDefinition {
                definition: u16::from_le_bytes([bytes[0], bytes[1]]),
                argument: u16::from_le_bytes([bytes[2], bytes[3]]),
                extra: bytes[4],
            }),
        };
        Ok(value)
    }

    pub fn as_string(&self) -> Option<StringDescriptor> {
        match self {
            ScalarValue::String(descriptor) => Some(*descriptor),
            _ => None,
        }
    }
}

/// Format a float with the 9 significant digits PRINT shows. Magnitudes
/// PRINT cannot show in fixed point, 1E+09 and up or below 0.01, use its
/// exponent form, e.g. `1.5E-05`.
pub fn format_float(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    // rounding first, 999999999.6 prints as 1E+09
    let scientific = format!("{:.8e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = match exponent.parse() {
        Ok(exponent) => exponent,
        Err(_) => return scientific,
    };

    if (-2..=8).contains(&exponent) {
        let rounded: f64 = scientific.parse().unwrap_or(value);
        return format!("{}", rounded);
    }
    let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}E{}{:02}", mantissa, sign, exponent.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_floats() {
        assert_eq!(decode_float(&[0x81, 0x00, 0x00, 0x00, 0x00]), 1.0);
        assert_eq!(decode_float(&[0x81, 0x80, 0x00, 0x00, 0x00]), -1.0);
        assert_eq!(decode_float(&[0x82, 0x60, 0x00, 0x00, 0x00]), 3.5);
        assert_eq!(decode_float(&[0x80, 0x00, 0x00, 0x00, 0x00]), 0.5);
        assert_eq!(decode_float(&[0x98, 0x35, 0x44, 0x7a, 0x00]), 11879546.0);
    }

    #[test]
    fn test_zero_exponent_ignores_mantissa() {
        assert_eq!(decode_float(&[0x00, 0xff, 0x12, 0x34, 0x56]), 0.0);
    }

    #[test]
    fn test_exact_values_round_trip() {
        for value in [1.0, -1.0, 3.5, 0.5, 0.375, -1024.25, 65535.0, 2f64.powi(-100)] {
            let bytes = encode_float(value).unwrap();
            assert_eq!(decode_float(&bytes), value, "value {}", value);
            assert_eq!(encode_float(decode_float(&bytes)), Some(bytes));
        }
    }

    #[test]
    fn test_inexact_values_do_not_encode() {
        assert_eq!(encode_float(0.1), None);
        assert_eq!(encode_float(f64::NAN), None);
        assert_eq!(encode_float(1e300), None);
    }

    #[test]
    fn test_integers_are_big_endian() {
        assert_eq!(decode_integer([0x00, 0x05]), 5);
        assert_eq!(decode_integer([0xff, 0xfe]), -2);
        assert_eq!(decode_integer([0x80, 0x00]), -32768);
    }

    #[test]
    fn test_scalar_tag_follows_kind() {
        let bytes = [0x02, 0xfd, 0x9f, 0x00, 0x00];
        assert_eq!(
            ScalarValue::decode(VariableKind::String, &bytes),
            Ok(ScalarValue::String(StringDescriptor {
                length: 2,
                pointer: 0x9ffd
            }))
        );
        assert_eq!(
            ScalarValue::decode(VariableKind::Integer, &bytes),
            Ok(ScalarValue::Integer(0x02fd))
        );
        assert!(ScalarValue::decode(VariableKind::Float, &bytes[..4]).is_err());
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(3.5), "3.5");
        assert_eq!(format_float(decode_float(&[0x7d, 0x4c, 0xcc, 0xcc, 0xcd])), "0.1");
        assert_eq!(format_float(-1024.25), "-1024.25");
        assert_eq!(format_float(0.0), "0");
    }

    #[test]
    fn test_format_float_exponent_form() {
        // largest value the 5-byte format holds
        let largest = decode_float(&[0xff, 0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(format_float(largest), "1.70141183E+38");
        assert_eq!(format_float(-largest), "-1.70141183E+38");
        assert_eq!(format_float(1e20), "1E+20");
        assert_eq!(format_float(1.5e-5), "1.5E-05");
        assert_eq!(format_float(1e9), "1E+09");
        assert_eq!(format_float(999999999.6), "1E+09");
    }

    #[test]
    fn test_format_float_fixed_range_edges() {
        assert_eq!(format_float(123456789.0), "123456789");
        assert_eq!(format_float(0.01), "0.01");
        assert_eq!(format_float(0.009), "9E-03");
    }
}
