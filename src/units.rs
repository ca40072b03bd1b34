//! Unit conversion and label formatting.
//!
//! Lengths come out of the session in metres, are stored in centimetres, and
//! are only converted to the display unit when a label is rendered.

use std::str::FromStr;

use derive_more::Display;

use crate::error::{MeasureError, Result};

/// Inches in one centimetre.
pub const INCH_PER_CM: f64 = 0.3937007874;

/// Centimetres in one inch.
pub const CM_PER_INCH: f64 = 2.54;

/// Display unit for measured lengths.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    #[default]
    #[display("cm")]
    Centimeter,
    #[display("in")]
    Inch,
}

impl Unit {
    /// Short symbol appended to floating annotations.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Centimeter => "cm",
            Unit::Inch => "in",
        }
    }

    /// The other unit. The unit button cycles between the two.
    pub fn toggled(self) -> Self {
        match self {
            Unit::Centimeter => Unit::Inch,
            Unit::Inch => Unit::Centimeter,
        }
    }
}

impl FromStr for Unit {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Ok(Unit::Centimeter)
            }
            "in" | "inch" | "inches" | "\"" => Ok(Unit::Inch),
            _ => Err(MeasureError::UnknownUnit(s.to_string())),
        }
    }
}

#[inline]
pub fn to_centimeters(meters: f64) -> f64 {
    meters * 100.0
}

#[inline]
pub fn centimeters_to_inches(cm: f64) -> f64 {
    cm * INCH_PER_CM
}

#[inline]
pub fn inches_to_centimeters(inch: f64) -> f64 {
    inch * CM_PER_INCH
}

/// Converts a stored centimetre value into `unit`.
#[inline]
pub fn from_centimeters(cm: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Centimeter => cm,
        Unit::Inch => centimeters_to_inches(cm),
    }
}

/// Converts a value expressed in `unit` back to centimetres.
#[inline]
pub fn to_centimeters_from(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Centimeter => value,
        Unit::Inch => inches_to_centimeters(value),
    }
}

/// UI label convention: caption first, one decimal place.
///
/// ```
/// use bevy_ar_measure::units::format_label;
/// assert_eq!(format_label(42.26, "Width"), "Width: 42.3");
/// ```
pub fn format_label(value: f64, label: &str) -> String {
    format!("{label}: {value:.1}")
}

/// Floating annotation convention: two decimal places, unit symbol last.
///
/// ```
/// use bevy_ar_measure::units::format_annotation;
/// assert_eq!(format_annotation(100.0, "cm"), "100.00 cm");
/// ```
pub fn format_annotation(value: f64, label: &str) -> String {
    format!("{value:.2} {label}")
}

/// Like [`format_label`], but shows the bare caption while nothing is measured.
pub fn format_readout(label: &str, value: Option<f64>) -> String {
    match value {
        Some(value) => format_label(value, label),
        None => format!("{label}:"),
    }
}
