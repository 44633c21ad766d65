use super::engine::round_to;

const GROUP_SEPARATOR: char = '\u{a0}';

/// Renders an amount with Russian digit grouping: `1 234 567,5`.
pub fn format_amount(value: f64) -> String {
    let rounded = round_to(value, 2);
    let negative = rounded < 0.0;
    let total_cents = (rounded.abs() * 100.0).round() as u64;
    let whole = total_cents / 100;
    let cents = total_cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative && total_cents > 0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if cents > 0 {
        let fraction = format!("{cents:02}");
        out.push(',');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out
}

pub fn format_rub(value: f64) -> String {
    format!("{} ₽", format_amount(value))
}
