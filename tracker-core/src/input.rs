//! Lenient parsing of numbers typed into prompts.

/// Parse the leading integer of `input`.
///
/// Leading whitespace and a single sign are accepted, then as many decimal
/// digits as are present; anything after the digits is ignored, so `"12 hp"`
/// parses as 12. Returns `None` when no digit follows, or on overflow.
pub fn parse_int(input: &str) -> Option<i32> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits].parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_int("15"), Some(15));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("+3"), Some(3));
        assert_eq!(parse_int("  42"), Some(42));
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        assert_eq!(parse_int("12 hp"), Some(12));
        assert_eq!(parse_int("8.9"), Some(8));
    }

    #[test]
    fn test_rejects_non_numbers() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("- 5"), None);
        assert_eq!(parse_int("99999999999"), None);
    }
}
