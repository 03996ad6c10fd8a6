use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use polar_domain::constants::MIGRATION;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

/// A versioned schema script owned by one feature slice.
///
/// Scripts are applied once, in the order they were registered, and are
/// identified by `(slice, version)`. Editing an applied script is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub slice: &'static str,
    pub version: &'static str,
    pub script: &'static str,
}

impl Migration {
    #[must_use]
    pub const fn new(slice: &'static str, version: &'static str, script: &'static str) -> Self {
        Self { slice, version, script }
    }

    /// Stable fingerprint of the script body.
    #[must_use]
    pub fn checksum(&self) -> String {
        format!("{:016x}", fxhash::hash64(self.script.trim()))
    }

    fn key(&self) -> String {
        format!("{}:{}", self.slice, self.version)
    }

    fn to_applied(self) -> AppliedMigration {
        AppliedMigration {
            slice: self.slice.to_owned(),
            version: self.version.to_owned(),
            checksum: self.checksum(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

#[derive(Debug, Clone, PartialEq, Eq, SurrealValue)]
pub struct AppliedMigration {
    pub slice: String,
    pub version: String,
    pub checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    #[must_use]
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(
        &self,
        migrations: &[Migration],
    ) -> Result<MigrationReport, DatabaseError> {
        self.ensure_ledger().await?;
        let applied = self.applied_map().await?;

        let mut report = MigrationReport::default();
        for migration in migrations {
            if let Some(existing) = applied.get(&migration.key()) {
                ensure_checksum_match(migration, &existing.checksum)?;
                report.skipped.push(migration.to_applied());
                continue;
            }

            self.apply(migration).await?;
            report.applied.push(migration.to_applied());
        }

        Ok(report)
    }

    async fn ensure_ledger(&self) -> Result<(), DatabaseError> {
        let query = format!(
            "DEFINE TABLE IF NOT EXISTS {MIGRATION} SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS {MIGRATION}_key ON {MIGRATION} FIELDS slice, version UNIQUE;"
        );
        self.db
            .query(query)
            .await
            .context("Defining migration ledger")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE {MIGRATION} CONTENT {{ slice: $slice, version: $version, checksum: $checksum, applied_at: time::now() }};
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(query)
            .bind(("slice", migration.slice))
            .bind(("version", migration.version))
            .bind(("checksum", migration.checksum()))
            .await
            .context(format!("SQL execution failed at {}", migration.key()))?
            .check()
            .map_err(surrealdb::Error::from)
            .context(format!("Applying {}", migration.key()))?;

        Ok(())
    }

    async fn applied_map(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let entries = self
            .db
            .query(format!("SELECT slice, version, checksum FROM {MIGRATION}"))
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(0)
            .context("Parsing applied migrations")?;

        Ok(entries
            .into_iter()
            .map(|entry| (format!("{}:{}", entry.slice, entry.version), entry))
            .collect())
    }
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    let checksum = migration.checksum();
    if existing != checksum {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (recorded {existing}, script {checksum})",
                migration.key()
            )
            .into(),
            context: Some("Migration already applied with different contents".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_ignores_surrounding_whitespace() {
        let a = Migration::new("registration", "0001", "DEFINE TABLE student;");
        let b = Migration::new("registration", "0001", "\n  DEFINE TABLE student;\n");
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.checksum().len(), 16);
    }

    #[test]
    fn edited_script_is_rejected() {
        let original = Migration::new("registration", "0001", "DEFINE TABLE student;");
        let edited = Migration::new("registration", "0001", "DEFINE TABLE pupil;");

        assert!(ensure_checksum_match(&original, &original.checksum()).is_ok());
        let err = ensure_checksum_match(&edited, &original.checksum()).unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
    }
}
