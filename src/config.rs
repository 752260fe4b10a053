use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub encryption_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub registration: RegistrationMode,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub github: GithubConfig,
    pub submission_limit: u32,
    pub submission_window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let encryption_key = env_required("GROUPDESK_ENCRYPTION_KEY")?;

        let host: IpAddr = env_or("GROUPDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid GROUPDESK_HOST: {e}"))?;

        let port: u16 = env_or("GROUPDESK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid GROUPDESK_PORT: {e}"))?;

        let base_url = env_or("GROUPDESK_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let registration = match env_or("GROUPDESK_REGISTRATION", "closed").as_str() {
            "open" => RegistrationMode::Open,
            _ => RegistrationMode::Closed,
        };

        let max_body_size: usize = env_or("GROUPDESK_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid GROUPDESK_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("GROUPDESK_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid GROUPDESK_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_origins: Vec<String> = env_or("GROUPDESK_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_level = env_or("GROUPDESK_LOG_LEVEL", "info");

        let timeout_secs: u64 = env_or("GITHUB_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid GITHUB_TIMEOUT_SECS: {e}"))?;

        let github = GithubConfig {
            api_url: env_or("GITHUB_API_URL", "https://api.github.com")
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(timeout_secs),
        };

        let submission_limit: u32 = env_or("GROUPDESK_SUBMISSION_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid GROUPDESK_SUBMISSION_RATE_LIMIT: {e}"))?;

        Ok(Config {
            database_url,
            jwt_secret,
            encryption_key,
            host,
            port,
            base_url,
            registration,
            max_body_size,
            trusted_proxies,
            cors_origins,
            log_level,
            github,
            submission_limit,
            submission_window_secs: 60,
        })
    }

    /// Link handed to students. Display only, never consulted for authorization.
    pub fn share_url(&self, project_id: uuid::Uuid, secret_key: &str) -> String {
        format!("{}/join/{project_id}/{secret_key}", self.base_url)
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
