pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod presentation;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel::r2d2::PoolError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::runtime::Handle;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::capture::CaptureOrchestrator;
use application::history_service::HistoryService;
use handlers::history::ApiDoc;
use infrastructure::{DieselHistoryStore, DieselSnapshotLoader};
use presentation::FormatOptions;

pub use config::HistoryConfig;
pub use db::{create_capture_pool, create_pool, DbPool};

pub type DieselCapture = CaptureOrchestrator<DieselSnapshotLoader, DieselHistoryStore>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Capture orchestrator for an order write path, on its own pool. Pool
/// checkout, statement execution and the orchestrator's own wait are all
/// bounded by the configured snapshot timeout.
pub fn build_capture(config: &HistoryConfig, runtime: Handle) -> Result<DieselCapture, PoolError> {
    let pool = create_capture_pool(&config.database_url, config.snapshot_timeout)?;
    let loader = DieselSnapshotLoader::new(pool.clone(), config.snapshot_timeout);
    let store = DieselHistoryStore::new(pool).with_statement_timeout(config.snapshot_timeout);
    Ok(CaptureOrchestrator::new(
        loader,
        store,
        config.capture_config(),
        runtime,
    ))
}

/// Build and return an actix-web `Server` serving the history query API on
/// `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    format_options: FormatOptions,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(HistoryService::new(DieselHistoryStore::new(pool)));
    let format_options = web::Data::new(format_options);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(format_options.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/orders")
                    .route(
                        "/{id}/history",
                        web::get().to(handlers::history::list_history),
                    )
                    .route(
                        "/{id}/history/display",
                        web::get().to(handlers::history::display_history),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
