//! Error type for the stepping core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MdError>;

#[derive(Error, Debug)]
pub enum MdError {
    /// Arrays that must line up atom-for-atom do not
    #[error("length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("system has no atoms")]
    EmptySystem,

    /// Only 3 and 5 point Suzuki-Yoshida schemes are tabulated
    #[error("unsupported number of quadrature points: {0} (expected 3 or 5)")]
    UnsupportedQuadrature(usize),

    #[error("no atomic mass for element '{0}'")]
    UnknownElement(String),

    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// Raised by the external force evaluation
    #[error("force evaluation failed: {0}")]
    Force(String),

    #[error("charge evaluation failed: {0}")]
    Charge(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MdError {
    pub fn config(message: impl Into<String>) -> Self {
        MdError::InvalidConfig(message.into())
    }

    pub fn force(message: impl Into<String>) -> Self {
        MdError::Force(message.into())
    }

    pub fn charge(message: impl Into<String>) -> Self {
        MdError::Charge(message.into())
    }

    /// Fails unless `found == expected`.
    pub fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(MdError::LengthMismatch {
                what,
                expected,
                found,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(MdError::check_len("velocities", 3, 3).is_ok());
        let err = MdError::check_len("velocities", 3, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "length mismatch for velocities: expected 3, found 2"
        );
    }
}
