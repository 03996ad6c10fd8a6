//! Table names and tags shared between the stores, migrations and the HTTP layer.

pub const STUDENT: &str = "student";
pub const OFFERING: &str = "offering";
pub const MIGRATION: &str = "migration";

/// Slice key used for registration migrations.
pub const REGISTRATION: &str = "registration";

/// `OpenAPI` tags.
pub const SYSTEM_TAG: &str = "System";
pub const REGISTRATION_TAG: &str = "Registration";
pub const RECORDS_TAG: &str = "Records";
