use clap::{Parser, command};
use serde::{Deserialize, Serialize};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application.
     */
    pub logging: LoggingConfig,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
    /**
     * Record list configuration.
     */
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /**
     * Choropleth map configuration.
     */
    pub map: MapConfig,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread IDs .
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to log the log level.
     */
    pub level: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Whether to log file.
     */
    pub file: bool,
    /**
     * Optional path to a log file. Logs go to stdout when absent.
     */
    pub logfile: Option<String>,
    /**
     * Additional directives for logging configuration.
     */
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { target: true, thread_ids: true, thread_names: true, line_number: true, level: true, ansi: true, file: true, logfile: None, directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Type of the database (e.g., `PostgreSQL`).
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * `PostgreSQL` database type.
     */
    #[serde(rename_all = "camelCase")]
    Postgresql {
        connection_string: String,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: u64,
        acquire_slow_threshold: u64,
        idle_timeout: u64,
        max_lifetime: u64,
        #[serde(default)]
        run_migrations: bool,
    },
    /**
     * Process local store. Contents are lost on restart.
     */
    InMemory,
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * Address to bind to.
     */
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /**
     * HTTP port for the server.
     */
    pub http_port: u16,
    /**
     * Maximum accepted size of an uploaded CSV file in bytes.
     */
    #[serde(default = "default_max_import_bytes")]
    pub max_import_bytes: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_max_import_bytes() -> usize {
    4 * 1024 * 1024
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /**
     * Number of records per page in the record list.
     */
    pub page_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig { page_size: 10 }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    /**
     * Path to the GeoJSON file with region boundaries.
     */
    pub boundary_file: String,
    /**
     * Feature property holding the region name.
     */
    #[serde(default = "default_name_property")]
    pub name_property: String,
}

fn default_name_property() -> String {
    "name".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            logging: LoggingConfig::default(),
            database: Database {
                db_type: DatabaseType::Postgresql {
                    connection_string: String::new(),
                    max_connections: 5,
                    min_connections: 1,
                    acquire_timeout: 30,
                    acquire_slow_threshold: 60,
                    idle_timeout: 300,
                    max_lifetime: 3600,
                    run_migrations: true,
                },
            },
            server: Server { workers: 4, bind_address: "0.0.0.0".to_string(), http_port: 8080, max_import_bytes: 1024 },
            dashboard: DashboardConfig { page_size: 25 },
            map: MapConfig { boundary_file: "./config/regions.geojson".to_string(), name_property: "name".to_string() },
        };
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.logging.target, deserialized.logging.target);
        assert_eq!(config.logging.thread_ids, deserialized.logging.thread_ids);
        assert_eq!(config.logging.logfile, deserialized.logging.logfile);
        assert_eq!(config.logging.directives, deserialized.logging.directives);
        assert_eq!(config.server.workers, deserialized.server.workers);
        assert_eq!(config.server.http_port, deserialized.server.http_port);
        assert_eq!(config.server.bind_address, deserialized.server.bind_address);
        assert_eq!(config.dashboard.page_size, deserialized.dashboard.page_size);
        assert_eq!(config.map.boundary_file, deserialized.map.boundary_file);
        assert!(matches!(deserialized.database.db_type, DatabaseType::Postgresql { run_migrations: true, max_connections: 5, .. }));
    }

    #[test]
    fn test_config_defaults() {
        let config_str = r#"
            [logging]
            target = false
            threadIds = false
            threadNames = false
            lineNumber = false
            level = true
            ansi = false
            file = false
            directives = []

            [server]
            workers = 2
            httpPort = 8080

            [database]
            dbType = "inMemory"

            [map]
            boundaryFile = "./config/regions.geojson"
        "#;
        let config: Config = toml::from_str(config_str).unwrap();
        assert!(config.logging.logfile.is_none());
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.max_import_bytes, 4 * 1024 * 1024);
        assert_eq!(config.dashboard.page_size, 10);
        assert_eq!(config.map.name_property, "name");
        assert!(matches!(config.database.db_type, DatabaseType::InMemory));
    }
}
