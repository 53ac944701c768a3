//! CLI configuration

/// Configuration shared by all command handlers.
pub struct Config {
    /// Base URL of the orchestrator API.
    pub orchestrator_url: String,
}
