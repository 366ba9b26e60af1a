/// Parse a display price ("$12.34", "12.34 USD", ...) into a number.
/// Unparseable input is worth 0 so totals never fail on bad data.
pub fn parse_price(text: &str) -> f64 {
    match strip_non_numeric(text).parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Parse a price for optimization. Unparseable or non-positive values map to
/// infinity so they can never win a minimum and are filtered out by the
/// candidate validity check.
pub fn parse_candidate_price(text: &str) -> f64 {
    match strip_non_numeric(text).parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n,
        _ => f64::INFINITY,
    }
}

/// Fixed two-decimal currency string used when projecting a candidate back
/// into an item's display fields.
pub fn format_price(value: f64) -> String {
    format!("${:.2}", value)
}

fn strip_non_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}
