use derive_more::Display;

pub type Result<T> = core::result::Result<T, MeasureError>;

#[derive(Debug, Display, Clone, PartialEq)]
#[display("{self:?}")]
pub enum MeasureError {
    /// A unit name that is neither centimetres nor inches.
    UnknownUnit(String),
    /// A configuration field that must be finite and positive.
    InvalidConfig { field: &'static str, value: f64 },
}

impl std::error::Error for MeasureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeasureError::UnknownUnit("furlong".into());
        assert!(err.to_string().contains("furlong"));

        let err = MeasureError::InvalidConfig {
            field: "marker_radius",
            value: -1.0,
        };
        assert!(err.to_string().contains("marker_radius"));
    }
}
