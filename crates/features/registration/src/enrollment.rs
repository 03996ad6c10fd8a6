//! Cart commits: seat reservation, snapshotting and partial-failure reporting.

use crate::error::{RegistrationError, RegistrationErrorExt};
use crate::model::{CartVersion, ClassSnapshot, Selection};
use crate::store::{CatalogStore, StudentStore};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Why one selection of a commit did not make it into the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCause {
    /// The section had no seat left.
    NoSeats,
    /// No such section in the catalog.
    UnknownOffering,
    /// A seat was taken but the offering could not be read back.
    SnapshotUnavailable,
    /// A seat was taken but the cart write failed.
    CartWriteFailed,
    /// Another commit for the same student reset the cart first.
    CartSuperseded,
}

impl FailureCause {
    /// Capacity conflicts are legitimate outcomes; the rest are lookup or store faults.
    #[must_use]
    pub const fn is_capacity_conflict(self) -> bool {
        matches!(self, Self::NoSeats)
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoSeats => "no seats left",
            Self::UnknownOffering => "unknown offering",
            Self::SnapshotUnavailable => "offering unavailable after seat was taken",
            Self::CartWriteFailed => "cart write failed after seat was taken",
            Self::CartSuperseded => "cart was replaced by a concurrent commit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailedSelection {
    pub selection: Selection,
    pub cause: FailureCause,
    /// `true` when a seat taken for this selection was handed back.
    pub seat_released: bool,
}

/// Outcome of one commit. Successful selections stay committed even when others fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitReport {
    /// Cart version the commit wrote against.
    pub cart_version: CartVersion,
    /// Selections now in the cart, in request order.
    pub committed: Vec<Selection>,
    pub failed: Vec<FailedSelection>,
}

impl CommitReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// `"CSE 214-02"` style names of every failed selection, in request order.
    #[must_use]
    pub fn failed_selections(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.selection.to_string()).collect()
    }

    /// `failed to add: BIO 101-02, CHEM 201-01`, or `None` on a complete commit.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        (!self.is_complete())
            .then(|| format!("failed to add: {}", self.failed_selections().join(", ")))
    }

    /// # Errors
    /// [`RegistrationError::Conflict`] naming the failed selections.
    pub fn into_result(self) -> Result<Self, RegistrationError> {
        match self.failure_message() {
            None => Ok(self),
            Some(message) => Err(RegistrationError::Conflict {
                message: message.into(),
                context: Some("commit".into()),
            }),
        }
    }

    fn fail(&mut self, selection: &Selection, cause: FailureCause, seat_released: bool) {
        warn!(%selection, %cause, seat_released, "Selection not added");
        self.failed.push(FailedSelection { selection: selection.clone(), cause, seat_released });
    }
}

/// Replaces student carts while reserving seats one compare-and-decrement at a time.
#[derive(Debug, Clone)]
pub struct EnrollmentManager {
    students: Arc<dyn StudentStore>,
    catalog: Arc<dyn CatalogStore>,
    release_seat_on_failure: bool,
}

impl EnrollmentManager {
    pub fn new(
        students: Arc<dyn StudentStore>,
        catalog: Arc<dyn CatalogStore>,
        release_seat_on_failure: bool,
    ) -> Self {
        Self { students, catalog, release_seat_on_failure }
    }

    /// Replaces the cart of `student_id` with `selections`, in order.
    ///
    /// The cart is cleared first. Each selection then takes a seat, has its
    /// offering snapshotted and is appended to the cart. A selection that fails
    /// any step is reported in [`CommitReport::failed`] and the rest carry on.
    ///
    /// # Errors
    /// * [`RegistrationError::Malformed`] for an invalid selection, before anything is written.
    /// * Any error of the cart reset, which aborts the commit.
    /// * Any store error of a seat decrement or of the lookup behind a refused one. The
    ///   remaining selections are skipped, and selections appended before the fault stay
    ///   in the cart.
    #[instrument(skip(self, selections), fields(student = %student_id, requested = selections.len()))]
    pub async fn commit(
        &self,
        student_id: &str,
        selections: &[Selection],
    ) -> Result<CommitReport, RegistrationError> {
        for selection in selections {
            selection.validate()?;
        }

        let version =
            self.students.reset_selections(student_id).await.context("Resetting cart")?;
        let mut report = CommitReport { cart_version: version, ..CommitReport::default() };
        let mut superseded = false;

        for selection in selections {
            if superseded {
                report.fail(selection, FailureCause::CartSuperseded, false);
                continue;
            }

            if !self.catalog.try_decrement_capacity(selection).await.context("Taking a seat")? {
                let cause = self.classify_refusal(selection).await?;
                report.fail(selection, cause, false);
                continue;
            }

            let snapshot = match self.catalog.find_offering(selection).await {
                Ok(offering) => ClassSnapshot::from(&offering),
                Err(e) => {
                    warn!(%selection, error = %e, "Offering unreadable after seat was taken");
                    let released = self.compensate(selection).await;
                    report.fail(selection, FailureCause::SnapshotUnavailable, released);
                    continue;
                },
            };

            match self.students.append_selection(student_id, version, &snapshot).await {
                Ok(true) => report.committed.push(selection.clone()),
                Ok(false) => {
                    superseded = true;
                    let released = self.compensate(selection).await;
                    report.fail(selection, FailureCause::CartSuperseded, released);
                },
                Err(e) => {
                    warn!(%selection, error = %e, "Cart append failed after seat was taken");
                    match self.cart_holds(student_id, version, selection).await {
                        Some(true) => report.committed.push(selection.clone()),
                        Some(false) => {
                            let released = self.compensate(selection).await;
                            report.fail(selection, FailureCause::CartWriteFailed, released);
                        },
                        None => report.fail(selection, FailureCause::CartWriteFailed, false),
                    }
                },
            }
        }

        info!(
            committed = report.committed.len(),
            failed = report.failed.len(),
            version = version.0,
            "Cart committed"
        );
        Ok(report)
    }

    /// A refused decrement is either a full section or a section that does not exist.
    async fn classify_refusal(
        &self,
        selection: &Selection,
    ) -> Result<FailureCause, RegistrationError> {
        match self.catalog.find_offering(selection).await {
            Ok(_) => Ok(FailureCause::NoSeats),
            Err(RegistrationError::NotFound { .. }) => Ok(FailureCause::UnknownOffering),
            Err(e) => Err(e).context("Looking up refused offering"),
        }
    }

    /// Whether the cart at `version` already holds `selection`. A failed append may
    /// still have landed. `None` when the cart cannot be read, and the seat stays taken.
    async fn cart_holds(
        &self,
        student_id: &str,
        version: CartVersion,
        selection: &Selection,
    ) -> Option<bool> {
        match self.students.find_by_id(student_id).await {
            Ok(student) => Some(
                student.cart_version == version
                    && student.active_selections.iter().any(|s| s.selection() == *selection),
            ),
            Err(e) => {
                warn!(%selection, error = %e, "Cart unreadable after failed append");
                None
            },
        }
    }

    /// Hands a seat back once. Returns whether it was returned.
    async fn compensate(&self, selection: &Selection) -> bool {
        if !self.release_seat_on_failure {
            return false;
        }
        match self.catalog.release_capacity(selection).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%selection, error = %e, "Seat could not be released");
                false
            },
        }
    }
}
