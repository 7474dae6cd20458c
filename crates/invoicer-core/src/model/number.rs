//! Human-facing invoice numbers of the form `YYYY-NN`.

/// Format a number as `<year>-<sequence>` with the sequence padded to at
/// least two digits (`2024-01`, `2024-12`, `2024-103`).
pub fn generate_invoice_number(year: i32, sequence: u32) -> String {
    format!("{}-{:02}", year, sequence)
}

/// Split an invoice number into `(year, sequence)`.
///
/// The number must start with a four-digit year and `-` and be at least
/// seven characters long. The sequence is the run of digits after the
/// dash, so `2024-05a` reads as sequence 5. Returns `None` when there is no
/// such run or it does not fit in a `u32`.
pub fn parse_invoice_number(number: &str) -> Option<(i32, u32)> {
    if number.len() < 7 || !number.is_char_boundary(5) {
        return None;
    }
    let (year, rest) = number.split_at(5);
    let year = year.strip_suffix('-')?;
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rest = rest.strip_prefix('+').unwrap_or(rest);
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    Some((year.parse().ok()?, rest[..digits].parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_pads_to_minimum_width() {
        assert_eq!(generate_invoice_number(2024, 1), "2024-01");
        assert_eq!(generate_invoice_number(2024, 12), "2024-12");
        assert_eq!(generate_invoice_number(2024, 103), "2024-103");
    }

    #[test]
    fn test_parse_accepts_generated_numbers() {
        assert_eq!(parse_invoice_number("2024-01"), Some((2024, 1)));
        assert_eq!(parse_invoice_number("2024-103"), Some((2024, 103)));
    }

    #[test]
    fn test_parse_reads_leading_sequence_digits() {
        assert_eq!(parse_invoice_number("2024-05a"), Some((2024, 5)));
        assert_eq!(parse_invoice_number("2024-+12"), Some((2024, 12)));
        assert_eq!(parse_invoice_number("2024-07 (void)"), Some((2024, 7)));
    }

    #[test]
    fn test_parse_skips_malformed_numbers() {
        assert_eq!(parse_invoice_number("2024-xx"), None);
        assert_eq!(parse_invoice_number("2024-5"), None);
        assert_eq!(parse_invoice_number("24-05"), None);
        assert_eq!(parse_invoice_number("2024--3"), None);
        assert_eq!(parse_invoice_number("INV-2024"), None);
        assert_eq!(parse_invoice_number("2024-99999999999"), None);
        assert_eq!(parse_invoice_number("é024-05"), None);
        assert_eq!(parse_invoice_number(""), None);
    }
}
