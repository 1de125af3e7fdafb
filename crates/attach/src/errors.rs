use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachError {
    #[error("resource creation failed: {reason}")]
    Factory { reason: String },
    #[error("resource teardown failed: {reason}")]
    Teardown { reason: String },
}

impl AttachError {
    pub fn factory(reason: impl Into<String>) -> Self {
        Self::Factory {
            reason: reason.into(),
        }
    }

    pub fn teardown(reason: impl Into<String>) -> Self {
        Self::Teardown {
            reason: reason.into(),
        }
    }

    pub fn into_veneer_error(self, detail: impl Into<String>) -> veneer_core_types::VeneerError {
        let message = format!("{}: {}", self, detail.into());
        veneer_core_types::VeneerError::new(message)
    }
}
