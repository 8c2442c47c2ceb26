use std::fmt::Display;
use std::sync::Arc;

/// Logger handed to loaders, labelled with the integration that owns it.
///
/// Events go through `tracing` with an `integration` field; subscribers are
/// installed by the binary, never by library code.
#[derive(Clone, Debug)]
pub struct IntegrationLogger {
    label: Arc<str>,
}

impl IntegrationLogger {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            label: Arc::from(label.as_ref()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Logger for another integration, e.g. one loader.
    pub fn fork(&self, label: impl AsRef<str>) -> Self {
        Self::new(label)
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(integration = %self.label, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(integration = %self.label, "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(integration = %self.label, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(integration = %self.label, "{message}");
    }
}

impl Default for IntegrationLogger {
    fn default() -> Self {
        Self::new("quire")
    }
}
