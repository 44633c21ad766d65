pub const MIN_DEPOSIT: f64 = 2_000.0;
pub const MAX_DEPOSIT: f64 = 3_000_000.0;

/// Parses free-form field text the way a numeric input reports it: blank or
/// unparseable text reads as zero.
pub fn parse_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Blur policy for the deposit amount and the monthly deposit.
pub fn clamp_deposit(value: f64) -> f64 {
    if value < MIN_DEPOSIT {
        return MIN_DEPOSIT;
    }
    if value > MAX_DEPOSIT {
        return MAX_DEPOSIT;
    }
    value
}

/// Blur policy for the first deposit: there is no upper bound.
pub fn clamp_first_deposit(value: f64) -> f64 {
    if value < MIN_DEPOSIT {
        return MIN_DEPOSIT;
    }
    value
}
