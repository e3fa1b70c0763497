use std::time::Duration;

/// Default location of the report renderer / analysis service.
pub const DEFAULT_RENDERER_URL: &str = "http://localhost:5000";

pub const DEFAULT_RENDERER_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, assembled from command-line flags and their
/// `PACKLEDGER_*` environment fallbacks.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: String,
    pub renderer_url: String,
    pub renderer_timeout: Duration,
    pub verbose: bool,
}

impl Config {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            renderer_url: DEFAULT_RENDERER_URL.to_string(),
            renderer_timeout: Duration::from_secs(DEFAULT_RENDERER_TIMEOUT_SECS),
            verbose: false,
        }
    }

    pub fn with_renderer(mut self, url: impl Into<String>, timeout: Duration) -> Self {
        self.renderer_url = url.into();
        self.renderer_timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
