use chrono::{DateTime, Local};

pub fn unit_prefix(exponent: i16) -> &'static str {
    match exponent {
        -12 => "p",
        -9 => "n",
        -6 => "u",
        -3 => "m",
        0 => "",
        3 => "k",
        6 => "M",
        9 => "G",
        12 => "T",
        _ => "?",
    }
}

/// Split a value into a mantissa in [1, 1000) and an exponent that is a
/// multiple of three, clamped to the prefixes `unit_prefix` knows.
pub fn engineering(value: f64) -> (f64, i16) {
    if value == 0.0 || !value.is_finite() {
        return (value, 0);
    }
    let exponent = (value.abs().log10() / 3.0).floor() as i16 * 3;
    let mut exponent = exponent.clamp(-12, 12);
    // log10 rounding can leave exact powers of 1000 one group short
    if (value / 10f64.powi(exponent as i32)).abs() >= 1000.0 && exponent < 12 {
        exponent += 3;
    }
    (value / 10f64.powi(exponent as i32), exponent)
}

pub fn pretty_ts(ts: &DateTime<Local>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
