//! Amount formatting helpers
//!
//! Conversions between smallest-unit integers and decimal strings, plus the
//! display shortcuts used for balances, prices and addresses.

use thiserror::Error;

use crate::Amount;

/// Errors from parsing a user-entered amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount '{input}'")]
    Invalid { input: String },

    #[error("Amount '{input}' does not fit in 128 bits")]
    Overflow { input: String },
}

/// Render a smallest-unit amount as a decimal string without trailing zeros.
///
/// `format_units(1_500_000, 6) == "1.5"`
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, dec_part) = padded.split_at(padded.len() - decimals);
    let dec_part = dec_part.trim_end_matches('0');

    if dec_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, dec_part)
    }
}

/// Parse a decimal string into smallest units.
///
/// Digits beyond `decimals` are truncated.
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount, AmountError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AmountError::Empty);
    }
    let invalid = || AmountError::Invalid {
        input: value.to_string(),
    };
    let overflow = || AmountError::Overflow {
        input: value.to_string(),
    };

    let (int_part, dec_part) = match value.split_once('.') {
        Some((i, d)) => (i, d),
        None => (value, ""),
    };
    if int_part.is_empty() && dec_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !dec_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let decimals = decimals as usize;
    let mut fraction: String = dec_part.chars().take(decimals).collect();
    while fraction.len() < decimals {
        fraction.push('0');
    }

    let scale = 10u128.checked_pow(decimals as u32).ok_or_else(overflow)?;
    let whole: Amount = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| overflow())?
    };
    let fraction: Amount = if fraction.is_empty() {
        0
    } else {
        fraction.parse().map_err(|_| overflow())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Render an amount with exactly `places` decimals, rounding half up.
///
/// `format_fixed(5_750_000_000_000_000, 18, 6) == "0.005750"`
pub fn format_fixed(amount: Amount, decimals: u8, places: usize) -> String {
    let decimals = decimals as usize;
    let scaled = if decimals > places {
        match 10u128.checked_pow((decimals - places) as u32) {
            Some(divisor) => {
                let rounded_up = (amount % divisor) * 2 >= divisor;
                amount / divisor + u128::from(rounded_up)
            }
            None => 0,
        }
    } else {
        // Fewer decimals than places, pad on the right
        amount.saturating_mul(10u128.saturating_pow((places - decimals) as u32))
    };
    if places == 0 {
        return scaled.to_string();
    }

    let digits = format!("{:0>width$}", scaled, width = places + 1);
    let (int_part, dec_part) = digits.split_at(digits.len() - places);
    format!("{}.{}", int_part, dec_part)
}

/// Human-readable amount truncated to `decimal_length` decimals.
///
/// Returns `(pretty, full)`. Dust that would truncate to zero is shown as
/// `<0.000001`, and a `...` suffix marks decimals that were cut.
pub fn pretty_value(amount: Amount, decimals: u8, decimal_length: usize) -> (String, String) {
    let full = format_units(amount, decimals);
    let (int_part, dec_part) = match full.split_once('.') {
        Some((i, d)) => (i, d),
        None => (full.as_str(), ""),
    };
    let truncated: String = dec_part.chars().take(decimal_length).collect();
    let all_zero = truncated.chars().all(|c| c == '0');

    let pretty = if int_part != "0" || truncated.len() < decimal_length {
        if all_zero {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, truncated)
        }
    } else if all_zero {
        format!("<0.{}1", "0".repeat(decimal_length.saturating_sub(1)))
    } else {
        let cut = if dec_part.len() > truncated.len() { "..." } else { "" };
        format!("{}.{}{}", int_part, truncated, cut)
    };

    (pretty, full)
}

/// Fiat value of a token balance
pub fn token_balance_price_raw(amount: Amount, decimals: u8, price: f64) -> f64 {
    format_units(amount, decimals).parse::<f64>().unwrap_or(0.0) * price
}

/// Fiat value of a token balance, formatted as `$12.34`.
///
/// Zero renders as `$0.00`, anything under a cent as `<$0.01`, everything
/// else is floored to the cent.
pub fn token_balance_price_formatted(amount: Amount, decimals: u8, price: f64) -> String {
    let value = token_balance_price_raw(amount, decimals, price);
    if value <= 0.0 || !value.is_finite() {
        "$0.00".to_string()
    } else if value < 0.01 {
        "<$0.01".to_string()
    } else {
        format!("${:.2}", (value * 100.0).floor() / 100.0)
    }
}

/// Shorten a long decimal string to its first `start` and last `end` decimals
pub fn truncate_dec_value(amount: &str, start: usize, end: usize) -> String {
    let (int_part, dec_part) = match amount.split_once('.') {
        Some((i, d)) => (i, d),
        None => (amount, ""),
    };

    if dec_part.len() <= start + end {
        format!("{}.{}", int_part, dec_part)
    } else {
        format!(
            "{}.{}...{}",
            int_part,
            &dec_part[..start],
            &dec_part[dec_part.len() - end..]
        )
    }
}

/// Shorten an address to `0x123...890`
pub fn format_short_address(address: &str, start: usize, end: usize) -> String {
    if address.is_empty() || !address.is_ascii() {
        return String::new();
    }
    let addr = if address.starts_with("0x") {
        address.to_string()
    } else {
        format!("0x{}", address)
    };
    if addr.len() <= 8 {
        return addr;
    }
    let head_end = (start + 2).min(addr.len());
    let tail_start = addr.len().saturating_sub(end).max(head_end);
    format!("{}...{}", &addr[..head_end], &addr[tail_start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(1_000_000, 6), "1");
        assert_eq!(format_units(100, 18), "0.0000000000000001");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1.5", 18).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_units("5", 0).unwrap(), 5);
        assert_eq!(parse_units(".25", 2).unwrap(), 25);
        assert_eq!(parse_units("0.1239", 3).unwrap(), 123);
        assert_eq!(parse_units("", 18), Err(AmountError::Empty));
        assert!(matches!(parse_units("1e5", 18), Err(AmountError::Invalid { .. })));
        assert!(matches!(parse_units("-1", 18), Err(AmountError::Invalid { .. })));
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(5_750_000_000_000_000, 18, 6), "0.005750");
        assert_eq!(format_fixed(1_500_000_000_000_000_000, 18, 6), "1.500000");
        assert_eq!(format_fixed(230_000, 18, 6), "0.000000");
        // Half up
        assert_eq!(format_fixed(1_234_567_500_000_000_000, 18, 6), "1.234568");
        assert_eq!(format_fixed(1_234_567_499_999_999_999, 18, 6), "1.234567");
        assert_eq!(format_fixed(15, 1, 3), "1.500");
        assert_eq!(format_fixed(42, 0, 0), "42");
    }

    #[test]
    fn test_pretty_value() {
        let eth = 1_000_000_000_000_000_000u128;
        assert_eq!(pretty_value(eth + eth / 4, 18, 6).0, "1.25");
        assert_eq!(pretty_value(23 * eth, 18, 6).0, "23");
        assert_eq!(pretty_value(eth / 8, 18, 6).0, "0.125");
        assert_eq!(pretty_value(100, 18, 6).0, "<0.000001");
        assert_eq!(pretty_value(123_456_789_000_000, 18, 6).0, "0.000123...");
        assert_eq!(pretty_value(123_000_000_000_000, 18, 6).0, "0.000123");
    }

    #[test]
    fn test_token_balance_price() {
        let amount = 1_500_000_000_000_000_000u128;
        assert_eq!(token_balance_price_formatted(amount, 18, 2.5), "$3.75");
        assert_eq!(token_balance_price_formatted(1_000_000, 6, 1.0), "$1.00");
        assert_eq!(token_balance_price_formatted(100, 18, 2000.0), "<$0.01");
        assert_eq!(token_balance_price_formatted(0, 18, 2000.0), "$0.00");
        assert_eq!(token_balance_price_formatted(1_239_900, 6, 1.0), "$1.23");
    }

    #[test]
    fn test_truncate_dec_value() {
        assert_eq!(truncate_dec_value("23.8538272940178236", 3, 2), "23.853...36");
        assert_eq!(truncate_dec_value("0.123456789012345678", 4, 4), "0.1234...5678");
        assert_eq!(truncate_dec_value("123.45", 3, 2), "123.45");
    }

    #[test]
    fn test_format_short_address() {
        assert_eq!(format_short_address("0x1234567890abcdef", 3, 3), "0x123...def");
        assert_eq!(format_short_address("0x1234567890abcdef", 4, 4), "0x1234...cdef");
        assert_eq!(format_short_address("0x1234", 3, 3), "0x1234");
        assert_eq!(format_short_address("", 3, 3), "");
    }
}
