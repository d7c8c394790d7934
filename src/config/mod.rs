mod settings;

pub use settings::{AdminConfig, DatabaseConfig, JwtConfig, ServerConfig, Settings};

/// Check if running in production mode (based on RUN_MODE env var)
pub fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}
