use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod controller;
pub mod db;
pub mod executor;
pub mod planner;
pub mod resume;
pub mod store;
pub mod validate;

use config::{Config, ExecutorKind};
use controller::Controller;
use executor::{DockerExecutor, Executor, MockExecutor, NomadExecutor};
use planner::{Planner, TopologicalGrouped};
use store::{MemoryStore, ResultStore, SqliteStore};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hector_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hector Orchestrator...");

    let config = Config::from_env();

    let store: Arc<dyn ResultStore> = if config.database_path == ":memory:" {
        tracing::info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Opening database at {}", config.database_path);
        let pool = db::create_pool(&config.database_path)
            .await
            .expect("Failed to create database pool");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");
        Arc::new(SqliteStore::new(pool))
    };

    let executor: Arc<dyn Executor> = match config.executor {
        ExecutorKind::Docker => Arc::new(DockerExecutor::with_binary(&config.docker_binary)),
        ExecutorKind::Nomad => Arc::new(NomadExecutor::new(
            &config.nomad_addr,
            &config.sidecar_image,
            config.object_store.clone(),
        )),
        ExecutorKind::Mock => Arc::new(MockExecutor::new()),
    };
    let planner: Arc<dyn Planner> = Arc::new(TopologicalGrouped);
    let controller = Arc::new(Controller::new(Arc::clone(&store), executor));

    let state = api::AppState {
        store: Arc::clone(&store),
        planner,
        controller: Arc::clone(&controller),
    };
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Failed to start server");
    });

    // Pick up executions interrupted by the last shutdown.
    if let Err(err) = resume::resume_pending_definitions(&controller, &store).await {
        tracing::error!("Resume loop failed: {}", err);
    }

    server.await.expect("Server task panicked");
}
