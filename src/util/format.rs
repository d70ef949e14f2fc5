//! Number formatting for token counts and money amounts.

/// Format a token count metric-style.
///
/// `>= 1,000,000` renders as `N.NNm`, `>= 10,000` as an integer `k`,
/// `>= 1,000` as a one-decimal `k`, anything smaller as a literal integer.
/// Trailing zeros after the decimal point are trimmed (`1.50m` -> `1.5m`,
/// `128.0k` -> `128k`).
#[must_use]
pub fn format_token_count(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n >= 1_000_000.0 {
        format!("{}m", trim_zeros(&format!("{:.2}", n / 1_000_000.0)))
    } else if n >= 10_000.0 {
        format!("{}k", trim_zeros(&format!("{:.0}", n / 1_000.0)))
    } else if n >= 1_000.0 {
        format!("{}k", trim_zeros(&format!("{:.1}", n / 1_000.0)))
    } else {
        trim_zeros(&format!("{n}"))
    }
}

/// Format a token count for usage lines: small values literally, larger
/// values compact with the exact count in parentheses (`12.5k(12500)`).
#[must_use]
pub fn format_token_usage(n: Option<f64>) -> String {
    let Some(n) = n else {
        return "-".to_string();
    };
    if !n.is_finite() {
        return n.to_string();
    }
    if n < 1_000.0 {
        return trim_zeros(&format!("{n}"));
    }
    format!("{}({})", format_token_count(n), trim_zeros(&format!("{n}")))
}

/// Format a money amount rounded to at most six decimal places.
#[must_use]
pub fn trim_money(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let rounded = (v * 1e6).round() / 1e6;
    trim_zeros(&format!("{rounded:.6}"))
}

/// Strip trailing zeros (and a dangling decimal point) from a formatted
/// number.
#[must_use]
pub fn trim_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_count_millions() {
        assert_eq!(format_token_count(2_000_000.0), "2m");
        assert_eq!(format_token_count(1_500_000.0), "1.5m");
        assert_eq!(format_token_count(1_250_000.0), "1.25m");
    }

    #[test]
    fn token_count_large_thousands_drop_decimals() {
        assert_eq!(format_token_count(128_000.0), "128k");
        assert_eq!(format_token_count(32_768.0), "33k");
    }

    #[test]
    fn token_count_small_thousands_keep_one_decimal() {
        assert_eq!(format_token_count(4_096.0), "4.1k");
        assert_eq!(format_token_count(8_000.0), "8k");
    }

    #[test]
    fn token_count_below_thousand_is_literal() {
        assert_eq!(format_token_count(512.0), "512");
    }

    #[test]
    fn token_usage_includes_exact_count() {
        assert_eq!(format_token_usage(Some(12_600.0)), "13k(12600)");
        assert_eq!(format_token_usage(Some(1_234.0)), "1.2k(1234)");
        assert_eq!(format_token_usage(Some(42.0)), "42");
        assert_eq!(format_token_usage(None), "-");
    }

    // {:.0} rounds half to even, so the 12.5k tie lands on 12k
    #[test]
    fn token_count_half_k_tie_rounds_to_even() {
        assert_eq!(format_token_count(12_500.0), "12k");
    }

    #[test]
    fn money_is_trimmed_to_six_places() {
        assert_eq!(trim_money(0.000_123_456_789), "0.000123");
        assert_eq!(trim_money(1.5), "1.5");
        assert_eq!(trim_money(3.0), "3");
    }

    #[test]
    fn trim_zeros_leaves_integers_alone() {
        assert_eq!(trim_zeros("100"), "100");
        assert_eq!(trim_zeros("1.50"), "1.5");
        assert_eq!(trim_zeros("2.00"), "2");
    }
}
