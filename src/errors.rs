//! Error taxonomy for the stability pipeline.
//!
//! Only two conditions are errors: a parameter set outside its domain and a
//! malformed input series. Both are rejected before any computation starts.
//! Degenerate estimator windows (short history, zero variance, empty tail)
//! are ordinary branches with neutral fallbacks and never surface here.

pub type SigmaResult<T> = Result<T, SigmaError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SigmaError {
    /// A configuration parameter violates its domain constraint.
    InvalidConfiguration { param: &'static str, reason: String },
    /// The price/volume series cannot be processed.
    InvalidInput(String),
}

impl SigmaError {
    pub fn config(param: &'static str, reason: impl Into<String>) -> Self {
        SigmaError::InvalidConfiguration { param, reason: reason.into() }
    }

    pub fn input(reason: impl Into<String>) -> Self {
        SigmaError::InvalidInput(reason.into())
    }
}

impl std::error::Error for SigmaError {}

impl std::fmt::Display for SigmaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigmaError::InvalidConfiguration { param, reason } => {
                write!(f, "invalid configuration: {param} {reason}")
            }
            SigmaError::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_param() {
        let err = SigmaError::config("es_quantile", "must lie in (0, 1), got 1.5");
        let msg = err.to_string();
        assert!(msg.contains("es_quantile"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_input_error_message() {
        let err = SigmaError::input("prices is empty");
        assert_eq!(err.to_string(), "invalid input: prices is empty");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = SigmaError::input("x").into();
        assert!(err.downcast_ref::<SigmaError>().is_some());
    }
}
