use std::env;

/// Runtime configuration for the FileVault backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds to (default: 5000)
    pub port: u16,

    /// Base URL of the frontend, used to build preview/download links
    pub public_base_url: String,

    /// Base URL of this backend, used to resolve locally served blob URLs
    pub backend_url: String,

    /// Maximum upload size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Retention window applied to new uploads in hours (default: 24)
    pub default_ttl_hours: i64,

    /// Upper bound a client may request for the retention window (default: 168)
    pub max_ttl_hours: i64,

    /// Interval between expiry sweeps in seconds (default: 3600)
    pub sweep_interval_secs: u64,

    /// Static admin credential pair
    pub admin_username: String,
    pub admin_password: String,

    /// Secret used to sign admin bearer tokens
    pub jwt_secret: String,

    /// Lifetime of an issued admin token in hours (default: 24)
    pub admin_token_ttl_hours: i64,

    /// Blob storage backend: "local" or "s3" (default: "local")
    pub storage_backend: String,

    /// Directory used by the local storage backend (default: "uploads")
    pub local_storage_dir: String,

    /// Allowed CORS origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            public_base_url: "http://localhost:3000".to_string(),
            backend_url: "http://localhost:5000".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100 MB
            default_ttl_hours: 24,
            max_ttl_hours: 168,
            sweep_interval_secs: 3600,
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            jwt_secret: "secret".to_string(),
            admin_token_ttl_hours: 24,
            storage_backend: "local".to_string(),
            local_storage_dir: "uploads".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.port);

        Self {
            port,

            public_base_url: env::var("FRONTEND_URL").unwrap_or(default.public_base_url),

            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            default_ttl_hours: env::var("DEFAULT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_ttl_hours),

            max_ttl_hours: env::var("MAX_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_ttl_hours),

            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.sweep_interval_secs),

            admin_username: env::var("ADMIN_USERNAME").unwrap_or(default.admin_username),

            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(default.admin_password),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            admin_token_ttl_hours: env::var("ADMIN_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.admin_token_ttl_hours),

            storage_backend: env::var("STORAGE_BACKEND")
                .map(|v| v.to_lowercase())
                .unwrap_or(default.storage_backend),

            local_storage_dir: env::var("LOCAL_STORAGE_DIR").unwrap_or(default.local_storage_dir),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (relaxed limits, local storage)
    pub fn development() -> Self {
        Self {
            sweep_interval_secs: 60,
            ..Self::default()
        }
    }

    /// Create config for production (secrets must be provided)
    pub fn production() -> Self {
        let mut config = Self::from_env();
        config.admin_username =
            env::var("ADMIN_USERNAME").expect("CRITICAL: ADMIN_USERNAME must be set");
        config.admin_password =
            env::var("ADMIN_PASSWORD").expect("CRITICAL: ADMIN_PASSWORD must be set");
        config.jwt_secret = env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set");
        config
    }

    /// Clamp a client-requested retention window to the allowed range.
    pub fn clamp_ttl_hours(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_ttl_hours)
            .clamp(1, self.max_ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size, 100 * 1024 * 1024);
        assert_eq!(config.default_ttl_hours, 24);
        assert_eq!(config.max_ttl_hours, 168);
        assert_eq!(config.sweep_interval_secs, 3600);
        assert_eq!(config.storage_backend, "local");
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.storage_backend, "local");
    }

    #[test]
    fn test_clamp_ttl_hours() {
        let config = AppConfig::default();
        assert_eq!(config.clamp_ttl_hours(None), 24);
        assert_eq!(config.clamp_ttl_hours(Some(48)), 48);
        assert_eq!(config.clamp_ttl_hours(Some(0)), 1);
        assert_eq!(config.clamp_ttl_hours(Some(10_000)), 168);
    }
}
