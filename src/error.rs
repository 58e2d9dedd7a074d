use thiserror::Error;

/// Failure kinds surfaced by model construction, data ingestion and training.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sample {index} rejected: {reason}")]
    InvalidSample { index: usize, reason: String },

    #[error("non-finite loss at epoch {epoch}, batch {batch}")]
    NumericInstability { epoch: usize, batch: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offender() {
        let err = ModelError::InvalidSample {
            index: 7,
            reason: "label 3 not in {0, 1}".to_string(),
        };
        assert_eq!(err.to_string(), "sample 7 rejected: label 3 not in {0, 1}");

        let err = ModelError::NumericInstability { epoch: 2, batch: 14 };
        assert_eq!(err.to_string(), "non-finite loss at epoch 2, batch 14");
    }
}
