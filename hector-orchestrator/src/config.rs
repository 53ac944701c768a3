//! Orchestrator configuration
//!
//! Everything is bootstrapped from environment variables so the binary can
//! run unchanged in containers and on developer machines.

/// Which executor backend runs the jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// Local container daemon, driven through the docker CLI.
    Docker,
    /// Nomad cluster batch driver.
    Nomad,
    /// Deterministic-enough stub for development.
    Mock,
}

/// Object-store settings handed to the staging sidecars as their
/// environment. The orchestrator itself never talks to the object store.
#[derive(Debug, Clone, Default)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub use_ssl: String,
    pub bucket_name: String,
}

impl ObjectStoreConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_or_default("MINIO_ENDPOINT", ""),
            access_key_id: env_or_default("MINIO_ACCESS_KEY_ID", ""),
            secret_access_key: env_or_default("MINIO_SECRET_ACCESS_KEY", ""),
            use_ssl: env_or_default("MINIO_USE_SSL", "false"),
            bucket_name: env_or_default("MINIO_BUCKET_NAME", ""),
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to.
    pub bind_addr: String,

    /// Path of the SQLite database file; `:memory:` selects the in-memory
    /// store instead.
    pub database_path: String,

    /// Executor backend selection.
    pub executor: ExecutorKind,

    /// Binary used by the local container driver (docker or a compatible
    /// CLI such as podman).
    pub docker_binary: String,

    /// Base URL of the Nomad HTTP API.
    pub nomad_addr: String,

    /// Image run by the download/upload staging sidecars.
    pub sidecar_image: String,

    /// Environment handed to the staging sidecars.
    pub object_store: ObjectStoreConfig,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// Expected variables:
    /// - `HECTOR_BIND_ADDR` (default `0.0.0.0:8080`)
    /// - `HECTOR_DATABASE_PATH` (default `hector.sqlite`, `:memory:` for the
    ///   in-memory store)
    /// - `HECTOR_EXECUTOR` (`docker` | `nomad` | `mock`, default `docker`)
    /// - `HECTOR_DOCKER_BINARY` (default `docker`)
    /// - `NOMAD_ADDR` (default `http://127.0.0.1:4646`)
    /// - `HECTOR_SIDECAR_IMAGE`
    /// - `MINIO_ENDPOINT`, `MINIO_ACCESS_KEY_ID`, `MINIO_SECRET_ACCESS_KEY`,
    ///   `MINIO_USE_SSL`, `MINIO_BUCKET_NAME`
    pub fn from_env() -> Self {
        let executor = match env_or_default("HECTOR_EXECUTOR", "docker").as_str() {
            "nomad" => ExecutorKind::Nomad,
            "mock" => ExecutorKind::Mock,
            _ => ExecutorKind::Docker,
        };

        Self {
            bind_addr: env_or_default("HECTOR_BIND_ADDR", "0.0.0.0:8080"),
            database_path: env_or_default("HECTOR_DATABASE_PATH", "hector.sqlite"),
            executor,
            docker_binary: env_or_default("HECTOR_DOCKER_BINARY", "docker"),
            nomad_addr: env_or_default("NOMAD_ADDR", "http://127.0.0.1:4646"),
            sidecar_image: env_or_default("HECTOR_SIDECAR_IMAGE", "hector/sidecar:latest"),
            object_store: ObjectStoreConfig::from_env(),
        }
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
