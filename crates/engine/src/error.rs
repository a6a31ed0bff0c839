//! Unified error handling for the costing engine.

use thiserror::Error;

use recipe_cost_core::UnitError;

use crate::db::RepositoryError;

/// Error type returned by every costing operation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Referenced recipe, ingredient or product does not exist for the tenant.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or incomplete input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The caller's deadline expired before the read completed.
    #[error("Deadline exceeded after {0} ms")]
    DeadlineExceeded(u128),
}

impl PricingError {
    pub(crate) fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP-equivalent status code for the surrounding service layer.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Repository(_) => 500,
            Self::DeadlineExceeded(_) => 504,
        }
    }

    /// Message safe to show to end users.
    ///
    /// Store failures are reported generically; their detail only goes to logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Repository(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<UnitError> for PricingError {
    fn from(err: UnitError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result alias for costing operations.
pub type PricingResult<T> = Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::not_found("recipe", 12);
        assert_eq!(err.to_string(), "Not found: recipe 12");

        let err = PricingError::validation("missing recipe or product");
        assert_eq!(err.to_string(), "Validation error: missing recipe or product");
    }

    #[test]
    fn test_pricing_error_status_codes() {
        assert_eq!(PricingError::NotFound("x".to_string()).status_code(), 404);
        assert_eq!(PricingError::Validation("x".to_string()).status_code(), 400);
        assert_eq!(
            PricingError::Repository(RepositoryError::Unavailable("down".to_string()))
                .status_code(),
            500
        );
        assert_eq!(PricingError::DeadlineExceeded(50).status_code(), 504);
    }

    #[test]
    fn test_public_message_hides_store_detail() {
        let err = PricingError::Repository(RepositoryError::DataCorruption(
            "recipe_items.quantity is NULL".to_string(),
        ));
        assert_eq!(err.public_message(), "Internal server error");

        let err = PricingError::validation("negative quantity");
        assert!(err.public_message().contains("negative quantity"));
    }

    #[test]
    fn test_unit_error_is_validation() {
        let err: PricingError = UnitError::Unsupported("bushel".to_string()).into();
        assert!(matches!(err, PricingError::Validation(_)));
        assert!(err.to_string().contains("unsupported measurement unit"));
    }
}
