use thiserror::Error;

use crate::flows::{prompts, DialogError, UnsupportedTransition};
use crate::pricing::NotPriced;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A validated selection has no price. Points at a catalog and engine mismatch.
    #[error("catalog inconsistency: {0}")]
    CatalogInconsistency(NotPriced),
    #[error(transparent)]
    FlowTransition(#[from] UnsupportedTransition),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<DialogError> for DomainError {
    fn from(value: DialogError) -> Self {
        match value {
            DialogError::NotPriced(missing) => Self::CatalogInconsistency(missing),
            DialogError::Transition(error) => Self::FlowTransition(error),
            other @ (DialogError::UnknownCategory { .. } | DialogError::IncompleteDraft { .. }) => {
                Self::InvariantViolation(other.to_string())
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<DialogError> for ApplicationError {
    fn from(value: DialogError) -> Self {
        Self::Domain(DomainError::from(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text safe to send to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Internal { .. } => prompts::FAILURE,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    /// Internal failures never reach the user verbatim; the message stays in logs.
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Domain(error) => {
                InterfaceError::Internal { message: error.to_string(), correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::VehicleClass;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::{prompts, DialogError};
    use crate::pricing::NotPriced;

    fn not_priced() -> NotPriced {
        NotPriced { category: "已下架".to_owned(), sub_service: None, vehicle: VehicleClass::Small }
    }

    #[test]
    fn not_priced_becomes_catalog_inconsistency() {
        let error = ApplicationError::from(DialogError::NotPriced(not_priced()));
        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::CatalogInconsistency(not_priced()))
        );
    }

    #[test]
    fn incomplete_draft_becomes_invariant_violation() {
        let error = DomainError::from(DialogError::IncompleteDraft {
            step: "booking.confirm".to_owned(),
            field: "phone",
        });
        assert!(matches!(error, DomainError::InvariantViolation(ref message) if message.contains("phone")));
    }

    #[test]
    fn domain_error_maps_to_internal_with_correlation_id() {
        let interface = ApplicationError::from(DomainError::CatalogInconsistency(not_priced()))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::Internal {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.user_message(), prompts::FAILURE);
        assert!(!interface.user_message().contains("catalog"));
        assert_eq!(interface.correlation_id(), "req-1");
    }
}
