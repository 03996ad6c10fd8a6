//! Store contracts consumed by the rule engine and the enrollment manager.
//!
//! Both contracts are object safe and injected as `Arc<dyn ..>` so that the
//! `SurrealDB` implementation and the in-memory test double are interchangeable.

mod memory;
mod surreal;

pub use memory::{MemoryStore, StoreOperation};
pub use surreal::{SurrealStore, migrations};

use crate::error::RegistrationError;
use crate::model::{
    CartVersion, ClassOffering, ClassSnapshot, FieldUpdate, Selection, StudentRecord,
};
use crate::search::SearchTerm;
use async_trait::async_trait;
use std::fmt::Debug;

#[async_trait]
pub trait StudentStore: Send + Sync + Debug {
    /// # Errors
    /// `NotFound` when no student has this id.
    async fn find_by_id(&self, id: &str) -> Result<StudentRecord, RegistrationError>;

    /// Empties the cart and bumps its version in one write. Idempotent on an
    /// empty cart apart from the version bump.
    ///
    /// # Errors
    /// `NotFound` when no student has this id.
    async fn reset_selections(&self, id: &str) -> Result<CartVersion, RegistrationError>;

    /// Appends `snapshot` to the cart if the cart is still at `expected`.
    ///
    /// Returns `false` without writing when a concurrent reset moved the version.
    ///
    /// # Errors
    /// `NotFound` when no student has this id.
    async fn append_selection(
        &self,
        id: &str,
        expected: CartVersion,
        snapshot: &ClassSnapshot,
    ) -> Result<bool, RegistrationError>;

    /// # Errors
    /// `NotFound` when no student has this id.
    async fn update_field(&self, id: &str, update: FieldUpdate) -> Result<(), RegistrationError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync + Debug {
    /// # Errors
    /// `NotFound` when the section does not exist.
    async fn find_offering(&self, selection: &Selection)
    -> Result<ClassOffering, RegistrationError>;

    /// Takes one seat if any is left. `false` when the section is full or unknown, or when
    /// a concurrent writer won the record first.
    async fn try_decrement_capacity(&self, selection: &Selection)
    -> Result<bool, RegistrationError>;

    /// Hands one seat back.
    ///
    /// # Errors
    /// `NotFound` when the section does not exist.
    async fn release_capacity(&self, selection: &Selection) -> Result<(), RegistrationError>;

    /// Offerings matching one search term, ordered by course key then section.
    async fn search(&self, term: &SearchTerm) -> Result<Vec<ClassOffering>, RegistrationError>;
}
