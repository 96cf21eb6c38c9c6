use std::collections::HashMap;

lazy_static! {
    /// PETSCII codes that differ from ASCII in the upper case character set
    pub static ref PETSCII_SPECIALS: HashMap<u8, char> = {
        let mut m = HashMap::new();
        m.insert(0x5c, '£');
        m.insert(0x5e, '↑');
        m.insert(0x5f, '←');
        m.insert(0xff, 'π');
        m
    };
}

/// Convert PETSCII bytes to display text. Codes without a printable
/// equivalent are shown as `{$xx}`.
pub fn to_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for &b in bytes {
        if let Some(c) = PETSCII_SPECIALS.get(&b) {
            text.push(*c);
        } else {
            match b {
                0x20..=0x5d => text.push(b as char),
                // shifted letters
                0xc1..=0xda => text.push((b - 0x80) as char),
                _ => text.push_str(&format!("{{${:02x}}}", b)),
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(to_text(b"HELLO, WORLD 42!"), "HELLO, WORLD 42!");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(to_text(&[0x5c, 0x31, 0x5e, 0xff]), "£1↑π");
        assert_eq!(to_text(&[0xc1, 0xc2]), "AB");
    }

    #[test]
    fn test_control_codes_are_escaped() {
        assert_eq!(to_text(&[0x93, 0x41, 0x0d]), "{$93}A{$0d}");
    }
}
