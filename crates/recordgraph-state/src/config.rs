//! Store connection configuration.

/// Default SurrealDB namespace.
pub const DEFAULT_NAMESPACE: &str = "recordgraph";
/// Default SurrealDB database.
pub const DEFAULT_DATABASE: &str = "main";

/// Where and how to connect to the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Authenticated connection (e.g. SurrealDB Cloud over WebSocket)
    Cloud(CloudConfig),
    /// Unauthenticated connection URL (`mem://`, `surrealkv://path`, `ws://host`)
    Url {
        url: String,
        namespace: String,
        database: String,
    },
}

impl StoreConfig {
    /// In-memory store.
    pub fn in_memory() -> Self {
        Self::url("mem://")
    }

    /// Unauthenticated URL with the default namespace and database.
    pub fn url(url: impl Into<String>) -> Self {
        StoreConfig::Url {
            url: url.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// Cloud credentials win (see [`CloudConfig::from_env`]); otherwise
    /// `SURREALDB_URL` is used; otherwise the store is in-memory.
    pub fn from_env() -> Self {
        if let Ok(cloud) = CloudConfig::from_env() {
            return StoreConfig::Cloud(cloud);
        }
        match std::env::var("SURREALDB_URL") {
            Ok(url) => Self::url(url),
            Err(_) => Self::in_memory(),
        }
    }

    /// Endpoint or URL, for logging.
    pub fn endpoint(&self) -> &str {
        match self {
            StoreConfig::Cloud(cloud) => &cloud.endpoint,
            StoreConfig::Url { url, .. } => url,
        }
    }
}

/// Configuration for an authenticated SurrealDB connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "recordgraph")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create a new cloud configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "recordgraph")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("SURREALDB_ENDPOINT").map_err(|_| "SURREALDB_ENDPOINT not set")?;
        let username =
            std::env::var("SURREALDB_USERNAME").map_err(|_| "SURREALDB_USERNAME not set")?;
        let password =
            std::env::var("SURREALDB_PASSWORD").map_err(|_| "SURREALDB_PASSWORD not set")?;
        let namespace = std::env::var("SURREALDB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_config_uses_defaults() {
        let config = StoreConfig::url("surrealkv://data");
        assert_eq!(
            config,
            StoreConfig::Url {
                url: "surrealkv://data".to_string(),
                namespace: "recordgraph".to_string(),
                database: "main".to_string(),
            }
        );
        assert_eq!(config.endpoint(), "surrealkv://data");
    }

    #[test]
    fn test_cloud_builder() {
        let cloud = CloudConfig::new("wss://db.example", "user", "pw")
            .with_namespace("ns")
            .with_database("db")
            .with_root(true);
        assert_eq!(cloud.namespace, "ns");
        assert_eq!(cloud.database, "db");
        assert!(cloud.is_root);
        assert_eq!(StoreConfig::Cloud(cloud).endpoint(), "wss://db.example");
    }
}
