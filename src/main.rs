mod api;
mod dao;
mod model;
mod service;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::api::endpoints::configure;
use crate::api::middleware::timing_middleware;
use crate::api::state::AppState;
use crate::dao::memory::InMemoryRecordStore;
use crate::dao::records::{PostgresRecordStore, RecordStore};
use crate::model::config::{ApplicationArguments, Config, DatabaseType, LoggingConfig};
use crate::service::analytics::AnalyticsService;
use crate::service::boundaries::BoundaryDataset;
use crate::service::records::RecordService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use sqlx::{Pool, Postgres, pool};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/**
 * Main entry point for the application.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let prometheus = PrometheusMetricsBuilder::new("dengue_dashboard")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let record_store: Arc<dyn RecordStore> = match config.database.db_type.clone() {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime, run_migrations } => {
            let connection_pool: Pool<Postgres> = pool::PoolOptions::new()
                .max_connections(max_connections)
                .min_connections(min_connections)
                .acquire_timeout(Duration::from_millis(acquire_timeout))
                .acquire_slow_threshold(Duration::from_millis(acquire_slow_threshold))
                .idle_timeout(Duration::from_millis(idle_timeout))
                .max_lifetime(Duration::from_millis(max_lifetime))
                .connect(connection_string.as_str())
                .await
                .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?;
            if run_migrations {
                sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&connection_pool).await.map_err(|err| std::io::Error::other(format!("Failed to run database migrations: {err}")))?;
                tracing::info!("Database migrations applied");
            }
            register_db_metrics(&prometheus, connection_pool.clone())?;
            Arc::new(PostgresRecordStore::new(connection_pool))
        }
        DatabaseType::InMemory => {
            tracing::warn!("Using in-memory record store. Records are lost on restart");
            Arc::new(InMemoryRecordStore::new())
        }
    };

    let boundaries = BoundaryDataset::load(&config.map.boundary_file, &config.map.name_property).map_err(|err| std::io::Error::other(format!("Failed to load boundaries: {err}")))?;

    let record_service = RecordService::new(record_store);
    let analytics_service = AnalyticsService::new(Arc::new(boundaries));

    let state = web::Data::new(AppState::new(record_service, analytics_service, config.dashboard.page_size));
    let max_import_bytes = config.server.max_import_bytes;

    tracing::info!("Starting server on {}:{}", config.server.bind_address, config.server.http_port);

    HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_import_bytes))
            .configure(configure)
    })
    .bind((config.server.bind_address.as_str(), config.server.http_port))?
    .workers(config.server.workers)
    .run()
    .await
}

/**
 * Initializes tracing for the application.
 *
 * #Arguments
 * `logging`: The logging configuration.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in &logging.directives {
        env_filter = env_filter.add_directive(directive.parse().map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))?);
    }
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_file(logging.file);
    match &logging.logfile {
        Some(logfile) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(logfile).map_err(|err| std::io::Error::other(format!("Failed to open log file {logfile}: {err}")))?;
            tracing_subscriber::registry().with(env_filter).with(fmt_layer.with_ansi(false).with_writer(Mutex::new(file))).init();
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(fmt_layer.with_ansi(logging.ansi)).init();
        }
    }
    Ok(())
}

/**
 * Registers connection pool gauges and refreshes them in a separate thread.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauges with.
 * `connection_pool`: The connection pool to gather metrics from.
 */
fn register_db_metrics(prometheus_metrics: &PrometheusMetrics, connection_pool: Pool<Postgres>) -> Result<(), std::io::Error> {
    let max_connections_gauge = IntGauge::new("max_connections", "Connection pool maximum").map_err(|err| std::io::Error::other(format!("Failed to create max_connections gauge: {err}")))?;
    let min_connections_gauge = IntGauge::new("min_connections", "Connection pool minimum").map_err(|err| std::io::Error::other(format!("Failed to create min_connections gauge: {err}")))?;
    let active_connections_gauge = IntGauge::new("active_connections", "Connection pool active").map_err(|err| std::io::Error::other(format!("Failed to create active_connections gauge: {err}")))?;
    let idle_connections_gauge = IntGauge::new("idle_connections", "Connection pool idle").map_err(|err| std::io::Error::other(format!("Failed to create idle_connections gauge: {err}")))?;
    for gauge in [&max_connections_gauge, &min_connections_gauge, &active_connections_gauge, &idle_connections_gauge] {
        prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus gauge: {err}")))?;
    }
    thread::spawn(move || {
        loop {
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(connection_pool.num_idle() as i64);
            thread::sleep(Duration::from_secs(1));
        }
    });
    Ok(())
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
