const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            max_connections,
            log_level,
        }
    }

    /// A `--database-url` flag beats the environment.
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if database_url.is_some() {
            self.database_url = database_url;
        }
        self
    }
}
