//! Backslash-escape sub-machine for character and string literals
//! (spec §4.1): `\' \" \? \\ \b \f \n \r \t \v`, octal up to 3 digits,
//! `\xHH`, `\uHHHH`, `\UHHHHHHHH`.

/// Result of decoding one escape sequence starting right after the
/// backslash. `len` is the number of source bytes consumed *after* the
/// backslash (i.e. not counting the backslash itself).
pub struct Escape {
    pub value: char,
    pub len: usize,
}

/// Decode an escape sequence from `rest`, the bytes immediately following
/// a `\`. Returns `None` if `rest` doesn't start with a recognized escape;
/// the caller emits a diagnostic (spec §7, local recovery) and falls back
/// to treating the backslash as a literal character.
pub fn decode(rest: &str) -> Option<Escape> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    match first {
        '\'' => Some(Escape { value: '\'', len: 1 }),
        '"' => Some(Escape { value: '"', len: 1 }),
        '?' => Some(Escape { value: '?', len: 1 }),
        '\\' => Some(Escape { value: '\\', len: 1 }),
        'b' => Some(Escape { value: '\u{8}', len: 1 }),
        'f' => Some(Escape { value: '\u{c}', len: 1 }),
        'n' => Some(Escape { value: '\n', len: 1 }),
        'r' => Some(Escape { value: '\r', len: 1 }),
        't' => Some(Escape { value: '\t', len: 1 }),
        'v' => Some(Escape { value: '\u{b}', len: 1 }),
        'x' => decode_hex(rest, 1, 2),
        'u' => decode_hex(rest, 1, 4),
        'U' => decode_hex(rest, 1, 8),
        '0'..='7' => decode_octal(rest),
        _ => None,
    }
}

fn decode_hex(rest: &str, skip: usize, max_digits: usize) -> Option<Escape> {
    let digits: String = rest
        .chars()
        .skip(skip)
        .take(max_digits)
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let code = u32::from_str_radix(&digits, 16).ok()?;
    let value = char::from_u32(code).unwrap_or('\u{fffd}');
    Some(Escape {
        value,
        len: skip + digits.len(),
    })
}

fn decode_octal(rest: &str) -> Option<Escape> {
    let digits: String = rest
        .chars()
        .take(3)
        .take_while(|c| matches!(c, '0'..='7'))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let code = u32::from_str_radix(&digits, 8).ok()?;
    let value = char::from_u32(code).unwrap_or('\u{fffd}');
    Some(Escape {
        value,
        len: digits.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_escapes() {
        assert_eq!(decode("n").unwrap().value, '\n');
        assert_eq!(decode("t").unwrap().value, '\t');
        assert_eq!(decode("\\").unwrap().value, '\\');
    }

    #[test]
    fn hex_escape_two_digits() {
        let e = decode("x41rest").unwrap();
        assert_eq!(e.value, 'A');
        assert_eq!(e.len, 3); // 'x' + two hex digits
    }

    #[test]
    fn hex_escape_stops_at_first_non_hex_digit() {
        let e = decode("x4").unwrap();
        assert_eq!(e.value, '\u{4}');
        assert_eq!(e.len, 2);
    }

    #[test]
    fn universal_escape_four_digits() {
        let e = decode("u0041").unwrap();
        assert_eq!(e.value, 'A');
        assert_eq!(e.len, 5);
    }

    #[test]
    fn universal_escape_eight_digits() {
        let e = decode("U00000041rest").unwrap();
        assert_eq!(e.value, 'A');
        assert_eq!(e.len, 9);
    }

    #[test]
    fn octal_escape_up_to_three_digits() {
        let e = decode("101").unwrap();
        assert_eq!(e.value, 'A');
        assert_eq!(e.len, 3);
    }

    #[test]
    fn octal_escape_stops_at_fourth_digit() {
        let e = decode("1011").unwrap();
        assert_eq!(e.len, 3);
    }

    #[test]
    fn unknown_escape_is_none() {
        assert!(decode("z").is_none());
    }

    #[test]
    fn incomplete_hex_escape_with_no_digits_is_none() {
        assert!(decode("xg").is_none());
    }
}
