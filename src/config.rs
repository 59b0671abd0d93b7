use std::env;

/// Service configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub secure_cookies: bool,
    pub blob_base_url: String,
    pub run_jobs: bool,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/mise.db".to_string());

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| "Invalid PORT")?;

        let secure_cookies = parse_flag("SECURE_COOKIES", false)?;
        let run_jobs = parse_flag("RUN_JOBS", true)?;

        let blob_base_url = env::var("BLOB_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/blobs".to_string());
        url::Url::parse(&blob_base_url).map_err(|e| format!("Invalid BLOB_BASE_URL: {e}"))?;

        Ok(Config {
            database_url,
            host,
            port,
            secure_cookies,
            blob_base_url: blob_base_url.trim_end_matches('/').to_string(),
            run_jobs,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(key: &str, default: bool) -> Result<bool, String> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(format!("Invalid {key}: {other}")),
        },
    }
}
