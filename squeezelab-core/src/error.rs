//! Engine error types.
//!
//! Only invalid input is an error. Insufficient history, a region with no
//! following bar, or a horizon past the end of the data shrink the output
//! instead of failing the call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("bar sequence is empty")]
    EmptyInput,

    #[error("{name} must be a positive integer, got {value}")]
    InvalidWindow { name: &'static str, value: usize },

    #[error("band width multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),

    #[error("{name} must lie strictly between 0 and 1, got {value}")]
    InvalidQuantile { name: &'static str, value: f64 },

    #[error("hold period must be a positive number of bars, got {0}")]
    InvalidHorizon(usize),

    #[error("timestamps must be strictly increasing (violated at bar {index})")]
    UnorderedTimestamps { index: usize },
}

pub(crate) fn check_window(name: &'static str, value: usize) -> Result<(), EngineError> {
    if value == 0 {
        return Err(EngineError::InvalidWindow { name, value });
    }
    Ok(())
}

pub(crate) fn check_quantile(name: &'static str, value: f64) -> Result<(), EngineError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(EngineError::InvalidQuantile { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_bounds_are_exclusive() {
        assert!(check_quantile("q", 0.0).is_err());
        assert!(check_quantile("q", 1.0).is_err());
        assert!(check_quantile("q", f64::NAN).is_err());
        assert!(check_quantile("q", 0.5).is_ok());
    }

    #[test]
    fn zero_window_rejected() {
        assert_eq!(
            check_window("bb_window", 0),
            Err(EngineError::InvalidWindow {
                name: "bb_window",
                value: 0
            })
        );
        assert!(check_window("bb_window", 1).is_ok());
    }
}
