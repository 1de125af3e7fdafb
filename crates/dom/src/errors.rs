use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("node is not an element")]
    NotAnElement,
    #[error("appending would create a cycle")]
    Cycle,
    #[error("node belongs to a different document")]
    ForeignDocument,
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

impl DomError {
    pub fn selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    pub fn into_veneer_error(self, detail: impl Into<String>) -> veneer_core_types::VeneerError {
        let message = format!("{}: {}", self, detail.into());
        veneer_core_types::VeneerError::new(message)
    }
}
