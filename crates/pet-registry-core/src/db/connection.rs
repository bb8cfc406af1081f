use std::path::PathBuf;
use std::time::Duration;

use once_cell::unsync::OnceCell;
use rusqlite::Connection;
use serde::Serialize;

use crate::config::DbConfig;
use crate::error::{PetRegistryError, Result};

/// Busy timeout used by the liveness probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

const SUPPORTED_DRIVERS: [&str; 2] = ["sqlite", "org.sqlite.JDBC"];

/// Anything that can hand a repository a live connection.
pub trait ConnectionSource {
    fn acquire(&self) -> Result<&Connection>;
}

impl ConnectionSource for Connection {
    fn acquire(&self) -> Result<&Connection> {
        Ok(self)
    }
}

/// Diagnostic details reported by [`ConnectionProvider::test_connection`].
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub product_name: String,
    pub product_version: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Memory,
    File(PathBuf),
}

/// Lazily opened connection that is reused until released.
///
/// Not `Sync`: one provider serves one thread. Hosts that need concurrent
/// access should give each worker its own provider.
pub struct ConnectionProvider {
    config: DbConfig,
    conn: OnceCell<Connection>,
}

impl ConnectionProvider {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            conn: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Return the held connection, opening it on first use.
    pub fn acquire(&self) -> Result<&Connection> {
        self.conn.get_or_try_init(|| self.open())
    }

    /// Close the held connection. Calling this with nothing open is a no-op.
    pub fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => log::info!("Closed connection to {}", self.config.url),
                Err((_, e)) => log::warn!("Error closing connection to {}: {}", self.config.url, e),
            }
        }
    }

    /// Liveness probe. Never fails; an unopened provider is not active.
    ///
    /// Runs under a short busy timeout and restores the connection's own
    /// timeout afterwards.
    pub fn is_active(&self) -> bool {
        let Some(conn) = self.conn.get() else {
            return false;
        };
        let Ok(previous_ms) = busy_timeout_ms(conn) else {
            return false;
        };
        if conn.busy_timeout(PROBE_TIMEOUT).is_err() {
            return false;
        }

        let alive = conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok();

        let previous = Duration::from_millis(u64::try_from(previous_ms).unwrap_or(0));
        if let Err(e) = conn.busy_timeout(previous) {
            log::warn!("Could not restore busy timeout on {}: {}", self.config.url, e);
        }
        alive
    }

    /// Open (or reuse) the connection and report what it is connected to.
    pub fn test_connection(&self) -> Result<ConnectionInfo> {
        let conn = self.acquire()?;
        let product_version: String = conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .map_err(|e| PetRegistryError::Connection {
                message: "connection opened but did not answer".to_string(),
                source: Some(e),
            })?;
        Ok(ConnectionInfo {
            product_name: "SQLite".to_string(),
            product_version,
            url: self.config.url.clone(),
        })
    }

    fn open(&self) -> Result<Connection> {
        if !SUPPORTED_DRIVERS
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&self.config.driver))
        {
            return Err(PetRegistryError::Connection {
                message: format!("driver not available: {}", self.config.driver),
                source: None,
            });
        }

        if !self.config.username.is_empty() || !self.config.password.is_empty() {
            log::debug!("SQLite ignores credentials for user '{}'", self.config.username);
        }

        let target = parse_url(&self.config.url)?;
        let conn = match target {
            Target::Memory => Connection::open_in_memory(),
            Target::File(ref path) => Connection::open(path),
        }
        .map_err(|e| PetRegistryError::Connection {
            message: format!("could not open {}", self.config.url),
            source: Some(e),
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| PetRegistryError::Connection {
                message: format!("could not configure {}", self.config.url),
                source: Some(e),
            })?;

        log::info!("Opened connection to {}", self.config.url);
        Ok(conn)
    }
}

impl ConnectionSource for ConnectionProvider {
    fn acquire(&self) -> Result<&Connection> {
        ConnectionProvider::acquire(self)
    }
}

fn busy_timeout_ms(conn: &Connection) -> rusqlite::Result<i64> {
    conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))
}

/// Accepts `sqlite://path`, `jdbc:sqlite:path`, `sqlite:path`, `:memory:` forms
/// and bare filesystem paths.
fn parse_url(url: &str) -> Result<Target> {
    let rest = ["sqlite://", "jdbc:sqlite:", "sqlite:"]
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .unwrap_or(url)
        .trim();

    match rest {
        "" => Err(PetRegistryError::Connection {
            message: format!("no database path in url '{}'", url),
            source: None,
        }),
        ":memory:" => Ok(Target::Memory),
        path => Ok(Target::File(PathBuf::from(path))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DbConfig {
        DbConfig {
            url: "sqlite::memory:".to_string(),
            ..DbConfig::default()
        }
    }

    #[test]
    fn test_parse_url_forms() {
        assert_eq!(parse_url("sqlite::memory:").unwrap(), Target::Memory);
        assert_eq!(parse_url(":memory:").unwrap(), Target::Memory);
        assert_eq!(parse_url("jdbc:sqlite::memory:").unwrap(), Target::Memory);
        assert_eq!(
            parse_url("sqlite://pets.db").unwrap(),
            Target::File(PathBuf::from("pets.db"))
        );
        assert_eq!(
            parse_url("jdbc:sqlite:/var/lib/pets.db").unwrap(),
            Target::File(PathBuf::from("/var/lib/pets.db"))
        );
        assert_eq!(
            parse_url("data/pets.db").unwrap(),
            Target::File(PathBuf::from("data/pets.db"))
        );
        assert!(parse_url("sqlite://").is_err());
    }

    #[test]
    fn test_acquire_is_lazy_and_reused() {
        let provider = ConnectionProvider::new(memory_config());
        assert!(!provider.is_active());

        let first = provider.acquire().unwrap() as *const Connection;
        let second = provider.acquire().unwrap() as *const Connection;
        assert_eq!(first, second);
        assert!(provider.is_active());
    }

    #[test]
    fn test_state_survives_between_acquires() {
        let provider = ConnectionProvider::new(memory_config());
        provider
            .acquire()
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")
            .unwrap();
        let x: i64 = provider
            .acquire()
            .unwrap()
            .query_row("SELECT x FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(x, 7);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut provider = ConnectionProvider::new(memory_config());
        provider.release();
        provider.acquire().unwrap();
        provider.release();
        assert!(!provider.is_active());
        provider.release();

        // Reopens on demand after release
        provider.acquire().unwrap();
        assert!(provider.is_active());
    }

    #[test]
    fn test_unknown_driver_is_connectivity_error() {
        let provider = ConnectionProvider::new(DbConfig {
            driver: "com.mysql.cj.jdbc.Driver".to_string(),
            ..memory_config()
        });
        let err = provider.acquire().unwrap_err();
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("driver not available"));
        assert!(!provider.is_active());
    }

    #[test]
    fn test_unopenable_path_is_connectivity_error() {
        let provider = ConnectionProvider::new(DbConfig {
            url: "sqlite:///nonexistent/dir/pets.db".to_string(),
            ..DbConfig::default()
        });
        let err = provider.acquire().unwrap_err();
        assert!(err.is_connectivity());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_probe_keeps_busy_timeout() {
        let provider = ConnectionProvider::new(memory_config());
        let conn = provider.acquire().unwrap();
        conn.busy_timeout(Duration::from_millis(7_500)).unwrap();

        assert!(provider.is_active());
        assert_eq!(busy_timeout_ms(conn).unwrap(), 7_500);
    }

    #[test]
    fn test_connection_info_json() {
        let provider = ConnectionProvider::new(memory_config());
        let info = provider.test_connection().unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["product_name"], "SQLite");
        assert_eq!(json["url"], "sqlite::memory:");
        assert!(json["product_version"].is_string());
    }

    #[test]
    fn test_connection_info() {
        let provider = ConnectionProvider::new(memory_config());
        let info = provider.test_connection().unwrap();
        assert_eq!(info.product_name, "SQLite");
        assert!(!info.product_version.is_empty());
        assert_eq!(info.url, "sqlite::memory:");
    }
}
