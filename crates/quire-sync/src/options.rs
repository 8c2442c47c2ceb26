use serde_json::Value;

/// Options for one sync.
#[derive(Clone, Debug, Default)]
pub struct SyncOptions {
    /// Only run object loaders with these names. Function loaders are
    /// skipped whenever this is set.
    pub loaders: Option<Vec<String>>,
    /// Passed to every loader as `refresh_context_data`.
    pub context: Option<Value>,
}

impl SyncOptions {
    pub fn only_loaders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loaders = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether a loader named `name` (`None` for function loaders) may run.
    pub fn allows(&self, name: Option<&str>) -> bool {
        match (&self.loaders, name) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(names), Some(name)) => names.iter().any(|n| n == name),
        }
    }
}
