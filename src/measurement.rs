use std::fmt;

use crate::{
    command::Function,
    proto::conv::{engineering, unit_prefix},
};

/// Parse a counter reading such as `+00100000.0F` or `0.000123S`.
///
/// The trailing letter only tells frequency from period, so every `F` and
/// `S` is dropped before the number is parsed. Anything else that does not
/// parse yields `None`, never a default value.
pub fn parse_reading(response: &str) -> Option<f64> {
    let stripped: String = response.chars().filter(|c| !matches!(c, 'F' | 'S')).collect();
    stripped.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One value read from the counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub function: Function,
    pub value: f64,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mantissa, exponent) = engineering(self.value);
        write!(
            f,
            "{:.6} {}{}",
            mantissa,
            unit_prefix(exponent),
            self.function.unit()
        )
    }
}
