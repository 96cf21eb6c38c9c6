use std::fmt::{Display, Error, Formatter};

use bitreader::BitReader;

use crate::error::DecodeErrorKind;

/// What a variable slot holds, taken from bit 7 of both name bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Float,
    Integer,
    String,
    /// DEF FN, only found in the simple variable table
    Function,
}

impl VariableKind {
    fn from_markers(first: bool, second: bool) -> VariableKind {
        match (first, second) {
            (false, false) => VariableKind::Float,
            (true, true) => VariableKind::Integer,
            (false, true) => VariableKind::String,
            (true, false) => VariableKind::Function,
        }
    }

    fn markers(self) -> (bool, bool) {
        match self {
            VariableKind::Float => (false, false),
            VariableKind::Integer => (true, true),
            VariableKind::String => (false, true),
            VariableKind::Function => (true, false),
        }
    }

    /// Bytes used by one value of this kind
    pub fn value_size(self) -> usize {
        match self {
            VariableKind::Float | VariableKind::Function => 5,
            VariableKind::Integer => 2,
            VariableKind::String => 3,
        }
    }

    /// Suffix BASIC uses in source code
    pub fn suffix(self) -> &'static str {
        match self {
            VariableKind::Integer => "%",
            VariableKind::String => "$",
            VariableKind::Float | VariableKind::Function => "",
        }
    }
}

/// A packed two character variable name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableName {
    /// 7-bit characters, second is 0 for one letter names
    chars: [u8; 2],
    kind: VariableKind,
}

impl VariableName {
    /// Decode the two name bytes of a variable or array record
    pub fn decode(bytes: [u8; 2]) -> Result<VariableName, DecodeErrorKind> {
        let unrecognized = || DecodeErrorKind::UnrecognizedName { bytes };
        let mut br = BitReader::new(&bytes);

        let first_marker = br.read_bool().map_err(|_| unrecognized())?;
        let first = br.read_u8(7).map_err(|_| unrecognized())?;
        let second_marker = br.read_bool().map_err(|_| unrecognized())?;
        let second = br.read_u8(7).map_err(|_| unrecognized())?;

        let valid_first = first.is_ascii_uppercase();
        let valid_second = second == 0 || second.is_ascii_uppercase() || second.is_ascii_digit();
        if !valid_first || !valid_second {
            return Err(unrecognized());
        }

        Ok(VariableName {
            chars: [first, second],
            kind: VariableKind::from_markers(first_marker, second_marker),
        })
    }

    /// Pack a name the way the runtime stores it. Only the first two
    /// characters are significant, like in BASIC itself.
    pub fn encode(name: &str, kind: VariableKind) -> Option<[u8; 2]> {
        let mut chars = name.bytes();
        let first = chars.next()?;
        let second = chars.next().unwrap_or(0);
        let name = VariableName::decode([first, second]).ok()?;
        let (m0, m1) = kind.markers();
        Some([
            name.chars[0] | if m0 { 0x80 } else { 0 },
            name.chars[1] | if m1 { 0x80 } else { 0 },
        ])
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// The name without type suffix
    pub fn base(&self) -> String {
        self.chars
            .iter()
            .take_while(|c| **c != 0)
            .map(|c| *c as char)
            .collect()
    }
}

impl Display for VariableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.kind {
            VariableKind::Function => write!(f, "FN {}", self.base()),
            kind => write!(f, "{}{}", self.base(), kind.suffix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_kinds() {
        let float = VariableName::decode([b'A', 0x00]).unwrap();
        assert_eq!(float.kind(), VariableKind::Float);
        assert_eq!(float.to_string(), "A");

        let integer = VariableName::decode([b'I' | 0x80, 0x80]).unwrap();
        assert_eq!(integer.kind(), VariableKind::Integer);
        assert_eq!(integer.to_string(), "I%");

        let string = VariableName::decode([b'S', b'T' | 0x80]).unwrap();
        assert_eq!(string.kind(), VariableKind::String);
        assert_eq!(string.to_string(), "ST$");

        let function = VariableName::decode([b'F' | 0x80, b'1']).unwrap();
        assert_eq!(function.kind(), VariableKind::Function);
        assert_eq!(function.to_string(), "FN F1");
    }

    #[test]
    fn test_one_letter_names_pad_with_zero() {
        assert_eq!(VariableName::encode("X", VariableKind::Float), Some([b'X', 0x00]));
        assert_eq!(
            VariableName::encode("X", VariableKind::String),
            Some([b'X', 0x80])
        );
        assert_eq!(
            VariableName::encode("COUNT", VariableKind::Integer),
            Some([b'C' | 0x80, b'O' | 0x80])
        );
    }

    #[test]
    fn test_encode_decode_agree() {
        for kind in [
            VariableKind::Float,
            VariableKind::Integer,
            VariableKind::String,
            VariableKind::Function,
        ] {
            let bytes = VariableName::encode("Z9", kind).unwrap();
            let name = VariableName::decode(bytes).unwrap();
            assert_eq!(name.kind(), kind);
            assert_eq!(name.base(), "Z9");
        }
    }

    #[test]
    fn test_unrecognized_names() {
        assert_eq!(
            VariableName::decode([0x00, 0x00]),
            Err(DecodeErrorKind::UnrecognizedName { bytes: [0x00, 0x00] })
        );
        assert!(VariableName::decode([b'1', 0x00]).is_err());
        assert!(VariableName::decode([b'A', b'!']).is_err());
        assert!(VariableName::encode("", VariableKind::Float).is_none());
    }
}
