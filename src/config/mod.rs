use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub google: GoogleConfig,
    pub roles: RoleConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string; the in-memory store is used when absent
    pub uri: Option<String>,
    pub name: String,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tokeninfo_url: String,
}

/// Role names with special meaning to the relationship synchronizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Stream role that creates a Team record instead of a bucket entry
    pub team_role: String,
    /// Project role whose holders go into `managers`
    pub manager_role: String,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            team_role: "TEAM".to_string(),
            manager_role: "Project Manager".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page: u64,
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("MONGO_URI") {
            self.database.uri = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("MONGO_DB") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Google overrides
        if let Ok(v) = env::var("GOOGLE_CLIENT_ID") {
            self.google.client_id = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("GOOGLE_TOKENINFO_URL") {
            self.google.tokeninfo_url = v;
        }

        // Role overrides
        if let Ok(v) = env::var("STREAM_TEAM_ROLE") {
            self.roles.team_role = v;
        }
        if let Ok(v) = env::var("PROJECT_MANAGER_ROLE") {
            self.roles.manager_role = v;
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = v.parse().unwrap_or(self.pagination.default_limit);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().unwrap_or(self.pagination.max_limit);
        }

        self
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                uri: None,
                name: "roster".to_string(),
                connection_timeout: 3,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            google: GoogleConfig {
                client_id: None,
                client_secret: None,
                tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            },
            roles: RoleConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }

    pub fn development() -> Self {
        let mut config = Self::base(Environment::Development);
        config.security.jwt_secret = "development-secret".to_string();
        config.security.jwt_expiry_hours = 24 * 7; // 1 week
        config
    }

    fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.database.connection_timeout = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.database.connection_timeout = 5;
        config.security.jwt_expiry_hours = 4;
        config
    }
}
