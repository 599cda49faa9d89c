//! Display formatting shared by the views

/// `1234567.891` → `"1,234,567.89"` with at most `max_fraction` decimals and
/// trailing zeros dropped
pub fn format_number(value: f64, max_fraction: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", max_fraction, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac)) => (int_part, frac.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::with_capacity(fixed.len() + 4);
    // no "-0" after rounding
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_usd(value: f64, max_fraction: usize) -> String {
    let number = format_number(value, max_fraction);
    match number.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", number),
    }
}

/// Magnitude only, two decimals: `-3.5` → `"3.50%"`
pub fn format_percent_abs(value: f64) -> String {
    format!("{:.2}%", value.abs())
}

/// Explicit sign for gains: `1.5` → `"+1.50%"`, `-3.5` → `"-3.50%"`
pub fn format_percent_signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

pub fn format_billions(value: f64) -> String {
    format!("${:.2}B", value / 1e9)
}

pub fn format_millions(value: f64) -> String {
    format!("${:.0}M", value / 1e6)
}
