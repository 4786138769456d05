//! Result summarizer.
//!
//! Joins the solved assignment with the old allocation (left join on the
//! patient id) and flags the patients whose place changes.

mod kpi;

pub use kpi::AllocationKpi;

use serde::{Deserialize, Serialize};

use crate::models::Relation;

/// One report row: where a patient ends up and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRow {
    /// Patient id.
    pub patient: String,
    /// Place chosen by the solver (a bed or the out place).
    pub new_place: String,
    /// Place before the reconfiguration, if any.
    pub old_place: Option<String>,
    /// Whether `new_place` differs from `old_place`.
    pub moved: bool,
}

impl PlacementRow {
    /// Creates a row, deriving `moved`.
    pub fn new(
        patient: impl Into<String>,
        new_place: impl Into<String>,
        old_place: Option<String>,
    ) -> Self {
        let new_place = new_place.into();
        let moved = old_place.as_deref() != Some(new_place.as_str());
        Self {
            patient: patient.into(),
            new_place,
            old_place,
            moved,
        }
    }
}

/// Four-column allocation report plus the objective value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Rows in assignment order.
    pub rows: Vec<PlacementRow>,
    /// Objective value of the solve.
    pub objective: f64,
}

impl AllocationReport {
    /// Builds the report from a solved assignment, one row per patient.
    ///
    /// A patient absent from `old_allocation` gets `old_place = None`.
    pub fn summarize(
        assignment: &[(String, String)],
        old_allocation: &Relation,
        objective: f64,
    ) -> Self {
        let rows = assignment
            .iter()
            .map(|(patient, place)| {
                let old = old_allocation.values_of(patient).next().map(str::to_string);
                PlacementRow::new(patient.as_str(), place.as_str(), old)
            })
            .collect();
        Self { rows, objective }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows flagged as moved.
    pub fn moved_count(&self) -> usize {
        self.rows.iter().filter(|r| r.moved).count()
    }

    /// Place chosen for a patient.
    pub fn new_place_of(&self, patient: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.patient == patient)
            .map(|r| r.new_place.as_str())
    }

    /// `"<moved> out of <rows> babies should change beds."`
    pub fn summary_line(&self) -> String {
        format!(
            "{} out of {} babies should change beds.",
            self.moved_count(),
            self.row_count()
        )
    }
}
