use std::fmt;

use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::PersistenceError;

/// Type alias for the SQL Server client behind the pool.
pub type MssqlClient = tiberius::Client<Compat<TcpStream>>;

/// Connection pool for SQL Server.
pub type MssqlPool = deadpool_tiberius::Pool;

/// One checked-out pooled connection.
pub type MssqlConnection = deadpool::managed::Object<deadpool_tiberius::Manager>;

fn default_trust_cert() -> bool {
    true
}

/// Connection configuration for the adapter.
///
/// Immutable after construction and owned exclusively by the adapter.
#[derive(Clone, Deserialize)]
pub struct PersistenceInfo {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub max_pool_size: Option<usize>,
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
}

// Manual Debug so connection credentials never end up in logs
impl fmt::Debug for PersistenceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceInfo")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("max_pool_size", &self.max_pool_size)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

impl PersistenceInfo {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            port: None,
            max_pool_size: None,
            trust_cert: true,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = Some(max_pool_size);
        self
    }

    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }
}

/// Build a deadpool-managed tiberius pool from the configuration.
///
/// # Errors
///
/// Returns `PersistenceError::ConnectionError` if pool creation fails.
pub fn build_pool(info: &PersistenceInfo) -> Result<MssqlPool, PersistenceError> {
    let mut manager = deadpool_tiberius::Manager::new()
        .host(&info.host)
        .port(info.port.unwrap_or(1433))
        .database(&info.database)
        .basic_authentication(&info.user, &info.password)
        .max_size(info.max_pool_size.unwrap_or(20));

    if info.trust_cert {
        manager = manager.trust_cert();
    }

    manager.create_pool().map_err(|e| {
        PersistenceError::ConnectionError(format!("Failed to create SQL Server pool: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let info = PersistenceInfo::new("localhost", "app", "sa", "hunter2");
        let rendered = format!("{info:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let info: PersistenceInfo = serde_json::from_str(
            r#"{"host": "db", "database": "app", "user": "sa", "password": "pw"}"#,
        )
        .unwrap();
        assert_eq!(info.port, None);
        assert!(info.trust_cert);
    }
}
