use std::fmt::{Debug, Formatter};

#[derive(clap::Args, Clone)]
#[command(next_help_heading = "Database")]
#[group(id = "database")]
pub struct Database {
    #[arg(id = "db-user", long, env = "DB_USER", default_value = "layerdb")]
    pub username: String,
    #[arg(
        id = "db-password",
        long,
        env = "DB_PASSWORD",
        default_value = "layerdb"
    )]
    pub password: String,
    #[arg(id = "db-host", long, env = "DB_HOST", default_value = "localhost")]
    pub host: String,
    #[arg(id = "db-port", long, env = "DB_PORT", default_value_t = 5432)]
    pub port: u16,
    #[arg(id = "db-name", long, env = "DB_NAME", default_value = "layerdb")]
    pub name: String,
    /// A full connection URL, overriding the individual connection arguments
    #[arg(id = "db-url", long, env = "DB_URL")]
    pub url: Option<String>,

    #[arg(id = "db-max-conn", long, env = "DB_MAX_CONN", default_value_t = 75)]
    pub max_conn: u32,
    #[arg(id = "db-min-conn", long, env = "DB_MIN_CONN", default_value_t = 25)]
    pub min_conn: u32,
    /// Connect timeout, in seconds
    #[arg(
        id = "db-connect-timeout",
        long,
        env = "DB_CONNECT_TIMEOUT",
        default_value_t = 8
    )]
    pub connect_timeout: u64,
    /// Timeout acquiring a connection from the pool, in seconds
    #[arg(
        id = "db-acquire-timeout",
        long,
        env = "DB_ACQUIRE_TIMEOUT",
        default_value_t = 8
    )]
    pub acquire_timeout: u64,
    /// Maximum lifetime of a pooled connection, in seconds
    #[arg(
        id = "db-max-lifetime",
        long,
        env = "DB_MAX_LIFETIME",
        default_value_t = 3600
    )]
    pub max_lifetime: u64,
    /// Idle timeout of a pooled connection, in seconds
    #[arg(
        id = "db-idle-timeout",
        long,
        env = "DB_IDLE_TIMEOUT",
        default_value_t = 600
    )]
    pub idle_timeout: u64,
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("username", &self.username)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("url", &self.url.as_ref().map(|_| "***"))
            .field("max_conn", &self.max_conn)
            .field("min_conn", &self.min_conn)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Create the configuration from environment variables only.
    pub fn from_env() -> Result<Database, clap::Error> {
        #[derive(clap::Parser)]
        struct Cli {
            #[command(flatten)]
            database: Database,
        }

        use clap::Parser;
        Cli::try_parse_from(["layerdb"]).map(|cli| cli.database)
    }

    /// The connection URL, either the provided one, or one assembled from the parts.
    pub fn to_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.name
            ),
        }
    }
}
