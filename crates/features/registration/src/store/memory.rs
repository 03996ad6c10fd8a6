use super::{CatalogStore, StudentStore};
use crate::error::RegistrationError;
use crate::model::{
    CartVersion, ClassOffering, ClassSnapshot, FieldUpdate, Selection, StudentRecord,
};
use crate::search::SearchTerm;
use async_trait::async_trait;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use polar_domain::constants::{OFFERING, STUDENT};

/// Store calls that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FindStudent,
    ResetSelections,
    AppendSelection,
    UpdateField,
    FindOffering,
    DecrementCapacity,
    ReleaseCapacity,
    Search,
}

#[derive(Debug, Default)]
struct MemoryState {
    students: FxHashMap<String, StudentRecord>,
    offerings: FxHashMap<Selection, ClassOffering>,
    faults: FxHashMap<StoreOperation, usize>,
}

impl MemoryState {
    fn trip(&mut self, operation: StoreOperation) -> Result<(), RegistrationError> {
        match self.faults.get_mut(&operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(RegistrationError::StoreUnavailable {
                    message: format!("injected failure in {operation:?}").into(),
                    context: None,
                })
            },
            _ => Ok(()),
        }
    }

    fn student_mut(&mut self, id: &str) -> Result<&mut StudentRecord, RegistrationError> {
        self.students
            .get_mut(id)
            .ok_or_else(|| RegistrationError::not_found(STUDENT, id.to_owned()))
    }
}

/// Both store contracts over one mutex-guarded map.
///
/// Every call takes the lock once, so each conditional write is atomic. Used as
/// the test double and for running the server without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a student.
    pub fn insert_student(&self, student: StudentRecord) {
        self.state.lock().students.insert(student.id.clone(), student);
    }

    /// Inserts or replaces an offering.
    pub fn insert_offering(&self, offering: ClassOffering) {
        self.state.lock().offerings.insert(offering.selection(), offering);
    }

    #[must_use]
    pub fn student(&self, id: &str) -> Option<StudentRecord> {
        self.state.lock().students.get(id).cloned()
    }

    #[must_use]
    pub fn capacity(&self, selection: &Selection) -> Option<u32> {
        self.state.lock().offerings.get(selection).map(|o| o.capacity_remaining)
    }

    /// Makes the next `times` calls of `operation` fail with a store error.
    pub fn fail_next(&self, operation: StoreOperation, times: usize) {
        self.state.lock().faults.insert(operation, times);
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<StudentRecord, RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::FindStudent)?;
        state
            .students
            .get(id)
            .cloned()
            .ok_or_else(|| RegistrationError::not_found(STUDENT, id.to_owned()))
    }

    async fn reset_selections(&self, id: &str) -> Result<CartVersion, RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::ResetSelections)?;
        let student = state.student_mut(id)?;
        student.active_selections.clear();
        student.cart_version = student.cart_version.next();
        Ok(student.cart_version)
    }

    async fn append_selection(
        &self,
        id: &str,
        expected: CartVersion,
        snapshot: &ClassSnapshot,
    ) -> Result<bool, RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::AppendSelection)?;
        let student = state.student_mut(id)?;
        if student.cart_version != expected {
            return Ok(false);
        }
        student.active_selections.push(snapshot.clone());
        Ok(true)
    }

    async fn update_field(&self, id: &str, update: FieldUpdate) -> Result<(), RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::UpdateField)?;
        state.student_mut(id)?.apply(update);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_offering(
        &self,
        selection: &Selection,
    ) -> Result<ClassOffering, RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::FindOffering)?;
        state
            .offerings
            .get(selection)
            .cloned()
            .ok_or_else(|| RegistrationError::not_found(OFFERING, selection.to_string()))
    }

    async fn try_decrement_capacity(
        &self,
        selection: &Selection,
    ) -> Result<bool, RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::DecrementCapacity)?;
        match state.offerings.get_mut(selection) {
            Some(offering) if offering.capacity_remaining > 0 => {
                offering.capacity_remaining -= 1;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn release_capacity(&self, selection: &Selection) -> Result<(), RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::ReleaseCapacity)?;
        let offering = state
            .offerings
            .get_mut(selection)
            .ok_or_else(|| RegistrationError::not_found(OFFERING, selection.to_string()))?;
        offering.capacity_remaining = offering.capacity_remaining.saturating_add(1);
        Ok(())
    }

    async fn search(&self, term: &SearchTerm) -> Result<Vec<ClassOffering>, RegistrationError> {
        let mut state = self.state.lock();
        state.trip(StoreOperation::Search)?;
        let mut hits: Vec<ClassOffering> =
            state.offerings.values().filter(|offering| term.matches(offering)).cloned().collect();
        hits.sort_by_cached_key(ClassOffering::selection);
        Ok(hits)
    }
}
