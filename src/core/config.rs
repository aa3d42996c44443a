use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub connection_lifetime_secs: u64,
    pub app_env: String,
    /// Costo bcrypt usato in fase di registrazione
    pub hash_rounds: u32,
    /// Protocollo e host pubblici, usati per costruire gli URL `next` della paginazione
    pub protocol: String,
    pub public_host: String,
    /// Cartella servita su `/public` (contiene `temp/` e `posts/`)
    pub public_dir: PathBuf,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set in .env file".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = parse_var("SERVER_PORT", 3000u16)
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = parse_var("MAX_DB_CONNECTIONS", 100u32)
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let connection_lifetime_secs = parse_var("DB_CONNECTION_LIFETIME_SECS", 1800u64).map_err(
            |_| "Invalid DB_CONNECTION_LIFETIME_SECS: must be a positive number".to_string(),
        )?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let hash_rounds = parse_var("HASH_ROUNDS", 10u32)
            .map_err(|_| "Invalid HASH_ROUNDS: must be a number between 4-31".to_string())?;
        if !(4..=31).contains(&hash_rounds) {
            return Err("Invalid HASH_ROUNDS: must be a number between 4-31".to_string());
        }

        let protocol = env::var("PROTOCOL").unwrap_or_else(|_| "http".to_string());
        let public_host = env::var("HOST").unwrap_or_else(|_| format!("localhost:{}", server_port));

        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public"));

        let access_token_ttl_secs = parse_var("ACCESS_TOKEN_TTL_SECS", 300i64)
            .map_err(|_| "Invalid ACCESS_TOKEN_TTL_SECS: must be a number".to_string())?;
        let refresh_token_ttl_secs = parse_var("REFRESH_TOKEN_TTL_SECS", 3600i64)
            .map_err(|_| "Invalid REFRESH_TOKEN_TTL_SECS: must be a number".to_string())?;

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            connection_lifetime_secs,
            app_env,
            hash_rounds,
            protocol,
            public_host,
            public_dir,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
        })
    }

    /// Configurazione minima per i test: nessuna variabile d'ambiente letta
    pub fn for_tests(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            max_connections: 5,
            connection_lifetime_secs: 60,
            app_env: "test".to_string(),
            hash_rounds: 4,
            protocol: "http".to_string(),
            public_host: "localhost:3000".to_string(),
            public_dir: env::temp_dir().join("blog-server-public"),
            access_token_ttl_secs: 300,
            refresh_token_ttl_secs: 3600,
        }
    }

    /// Base degli URL pubblici, es. `http://localhost:3000`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.public_host)
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!(
            environment = %self.app_env,
            address = %format!("{}:{}", self.server_host, self.server_port),
            public_url = %self.base_url(),
            database = %Self::mask_url(&self.database_url),
            max_db_connections = self.max_connections,
            connection_lifetime_secs = self.connection_lifetime_secs,
            public_dir = %self.public_dir.display(),
            "Server configuration loaded"
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("JWT secret: custom secret configured");
        }
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, T::Err> {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>(),
        Err(_) => Ok(default),
    }
}
