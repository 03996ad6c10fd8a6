//! # Database Infrastructure
//!
//! Connection management for [SurrealDB](https://surrealdb.com).
//!
//! ## Key Features
//! - **Engine Agnostic**: `mem://`, `rocksdb://`, `ws://` and `http://` through the `any` engine.
//! - **Resilient Connectivity**: health checks are retried with backoff while the engine starts.
//! - **Bounded Calls**: [`Database::bounded`] caps every store call with the configured timeout.
//! - **Migrations**: feature slices hand their versioned scripts to the builder, which applies
//!   the missing ones once and refuses edited ones.
//!
//! ## Example
//!
//! ```rust
//! use polar_database::{Database, DatabaseError, Migration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder()
//!         .url("mem://")
//!         .session("polar", "registration")
//!         .migration(Migration::new("demo", "0001", "DEFINE TABLE note SCHEMALESS;"))
//!         .init()
//!         .await?;
//!
//!     let _version = db.version().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::{AppliedMigration, Migration, MigrationReport};

use migrations::MigrationRunner;
use polar_domain::config::DatabaseConfig;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{info, instrument, trace, warn};

const HEALTH_ATTEMPTS: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct DatabaseInner {
    instance: Surreal<Any>,
    timeout: Duration,
    ns: String,
    db: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "SurrealDB session handle dropped");
    }
}

/// Shared `SurrealDB` handle. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Upper bound applied by [`Database::bounded`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Runs one database call under the configured timeout.
    ///
    /// `operation` names the call in error context and logs.
    ///
    /// # Errors
    /// * [`DatabaseError::Timeout`] when the call does not finish in time.
    /// * [`DatabaseError::Surreal`] when the call itself fails.
    pub async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, surrealdb::Error>>,
    {
        match tokio::time::timeout(self.inner.timeout, call).await {
            Ok(result) => result.context(operation),
            Err(_) => {
                warn!(operation, timeout = ?self.inner.timeout, "Database call timed out");
                Err(DatabaseError::Timeout {
                    message: format!("no answer within {:?}", self.inner.timeout).into(),
                    context: Some(operation.into()),
                })
            },
        }
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// Fluent builder for a `SurrealDB` connection.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    timeout: Option<Duration>,
    migrations: Vec<Migration>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds url, session, credentials and timeout from a `[database]` section.
    pub fn config(mut self, config: &DatabaseConfig) -> Self {
        self.url = Some(config.url.clone());
        self.ns = Some(config.namespace.clone());
        self.db = Some(config.database.clone());
        self.auth =
            config.credentials.as_ref().map(|c| (c.username.clone(), c.password.clone()));
        self.timeout = Some(Duration::from_millis(config.timeout_ms));
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Signs in as a root user after the engine is healthy.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Queues a schema migration. Order of registration is order of application.
    pub fn migration(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Connects, waits for the engine, signs in, selects the session and
    /// applies pending migrations.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if url, namespace or database are missing, or the timeout is zero.
    /// * [`DatabaseError::Connection`] if the engine fails to start or stays unhealthy.
    /// * [`DatabaseError::Auth`] if the credentials are rejected.
    /// * [`DatabaseError::Surreal`] if session activation or a migration script fails.
    /// * [`DatabaseError::Migration`] if an applied migration was edited.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = self.url.ok_or(DatabaseError::Validation {
            message: "URL is required".into(),
            context: None,
        })?;
        let ns = self.ns.ok_or(DatabaseError::Validation {
            message: "Namespace is required".into(),
            context: None,
        })?;
        let db = self.db.ok_or(DatabaseError::Validation {
            message: "Database is required".into(),
            context: None,
        })?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(DatabaseError::Validation {
                message: "Timeout must be greater than zero".into(),
                context: None,
            });
        }

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        let mut delay = Duration::from_millis(500);
        for attempt in 1..=HEALTH_ATTEMPTS {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == HEALTH_ATTEMPTS {
                return Err(DatabaseError::Connection {
                    message: "Unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Database not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        if let Some((username, password)) = self.auth {
            instance.signin(Root { username, password }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.into()) }
            })?;
        }

        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        let report = MigrationRunner::new(&instance).run(&self.migrations).await?;
        for skipped in &report.skipped {
            trace!(slice = %skipped.slice, version = %skipped.version, "Skipping migration");
        }
        for applied in &report.applied {
            info!(slice = %applied.slice, version = %applied.version, "Applied migration");
        }

        Ok(Database { inner: Arc::new(DatabaseInner { instance, timeout, ns, db }) })
    }
}
