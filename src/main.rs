use dotenvy::dotenv;
use order_history::{build_server, create_pool, run_migrations, HistoryConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match HistoryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = create_pool(&config.database_url);
    run_migrations(&pool);

    log::info!(
        "Starting history API at http://{}:{}",
        config.host,
        config.port
    );

    build_server(pool, config.format_options(), &config.host, config.port)?.await
}
