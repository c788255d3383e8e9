//! Application configuration loaded from environment variables.
//!
//! The service-account credentials double as both the Firestore project
//! identity and the key used to mint identity-provider access tokens.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service-account RSA private key (PEM)
    pub private_key: String,
    /// Service-account email
    pub client_email: String,
    /// GCP / Firebase project ID (also the expected ID-token audience)
    pub project_id: String,
    /// Realtime Database URL, passed through to provider initialization
    pub database_url: Option<String>,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            private_key: "test-private-key".to_string(),
            client_email: "service-account@test-project.iam.gserviceaccount.com".to_string(),
            project_id: "test-project".to_string(),
            database_url: None,
            frontend_url: "http://localhost:5173".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Absence of any required variable is a fatal startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            // Keys exported from the provider console carry literal "\n"
            // sequences which must become real newlines before PEM parsing.
            private_key: env::var("PRIVATE_KEY")
                .map_err(|_| ConfigError::Missing("PRIVATE_KEY"))?
                .replace("\\n", "\n"),
            client_email: env::var("CLIENT_EMAIL")
                .map_err(|_| ConfigError::Missing("CLIENT_EMAIL"))?,
            project_id: env::var("PROJECT_ID").map_err(|_| ConfigError::Missing("PROJECT_ID"))?,
            database_url: env::var("DATABASE_URL").ok(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("PRIVATE_KEY", "line1\\nline2");
        env::set_var("CLIENT_EMAIL", "svc@test-project.iam.gserviceaccount.com");
        env::set_var("PROJECT_ID", "test-project");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.private_key, "line1\nline2");
        assert_eq!(config.project_id, "test-project");
        assert_eq!(config.port, 3000);
    }
}
