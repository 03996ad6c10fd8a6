//! Registration feature slice.
//!
//! Two cores share the injected stores:
//! * [`rules::PrerequisiteEngine`] parses `;`-separated requirement expressions
//!   and evaluates them against a student record, stopping at the first failure.
//! * [`enrollment::EnrollmentManager`] replaces a student's cart, taking one seat
//!   per selection with a compare-and-decrement and reporting partial failures.
//!
//! Class search and the student record projections ride along on the same stores.
//!
//! ```rust,ignore
//! use polar_registration::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let slice = polar_registration::build(&config, store.clone(), store)?;
//! let report = slice.enrollment.commit("S1", &["CSE 214-01".parse()?]).await?;
//! ```

pub mod enrollment;
pub mod error;
pub mod model;
pub mod records;
pub mod rules;
pub mod search;
pub mod server;
pub mod store;

use crate::enrollment::EnrollmentManager;
use crate::error::{RegistrationError, RegistrationErrorExt};
use crate::records::StudentRecords;
use crate::rules::{PrerequisiteEngine, StandingThresholds};
use crate::search::ClassSearch;
use crate::store::{CatalogStore, StudentStore};
use polar_database::Migration;
use polar_domain::config::ApiConfig;
use polar_domain::registry::InitializedSlice;
use std::sync::Arc;

/// Registration slice state, shared by every handler.
#[polar_derive::polar_slice]
pub struct Registration {
    pub prerequisites: PrerequisiteEngine,
    pub enrollment: EnrollmentManager,
    pub records: StudentRecords,
    pub search: ClassSearch,
}

/// Wires the services of the slice over the given stores.
///
/// # Errors
/// [`RegistrationError::Malformed`] when the configured standing thresholds are invalid.
pub fn build(
    config: &ApiConfig,
    students: Arc<dyn StudentStore>,
    catalog: Arc<dyn CatalogStore>,
) -> Result<Registration, RegistrationError> {
    let thresholds = StandingThresholds::from_config(&config.registration)
        .context("registration.standing_thresholds")?;

    Ok(Registration::new(RegistrationInner {
        prerequisites: PrerequisiteEngine::new(Arc::clone(&students), thresholds),
        enrollment: EnrollmentManager::new(
            Arc::clone(&students),
            Arc::clone(&catalog),
            config.registration.release_seat_on_failure,
        ),
        records: StudentRecords::new(students),
        search: ClassSearch::new(catalog),
    }))
}

/// Builds the slice and wraps it for registration in the API state.
///
/// # Errors
/// See [`build`].
pub fn init(
    config: &ApiConfig,
    students: Arc<dyn StudentStore>,
    catalog: Arc<dyn CatalogStore>,
) -> Result<InitializedSlice, RegistrationError> {
    let slice = build(config, students, catalog)?;
    tracing::info!(
        release_seat_on_failure = config.registration.release_seat_on_failure,
        "Registration slice initialized"
    );
    Ok(InitializedSlice::new(slice))
}

/// Schema scripts the database must run before the `SurrealDB` store is used.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    store::migrations()
}
