/// Supplies the version string of the running app. Must always produce a value.
pub trait AppVersionProvider: Send + Sync {
    fn app_version(&self) -> String;
}

/// Version fixed at construction, typically read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVersionProvider {
    version: String,
}

impl StaticVersionProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for StaticVersionProvider {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl AppVersionProvider for StaticVersionProvider {
    fn app_version(&self) -> String {
        self.version.clone()
    }
}
