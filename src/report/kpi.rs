//! Allocation quality metrics (KPIs).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Moved | Patients whose new place differs from their old place |
//! | Retained | Patients kept on their old place |
//! | Discharged | Patients sent to the out place |
//! | Move Rate | Moved / patients |
//! | Occupancy | Patients per new place |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AllocationReport;

/// Allocation performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationKpi {
    /// Patients in the report.
    pub patient_count: usize,
    /// Patients that change place.
    pub moved_count: usize,
    /// Patients that keep their place.
    pub retained_count: usize,
    /// Patients sent to the out place.
    pub discharged_count: usize,
    /// Fraction of patients that move (0.0..1.0).
    pub move_rate: f64,
    /// Number of patients per chosen place.
    pub occupancy_by_place: BTreeMap<String, usize>,
}

impl AllocationKpi {
    /// Computes KPIs from a report.
    pub fn calculate(report: &AllocationReport, out_place: &str) -> Self {
        let patient_count = report.row_count();
        let moved_count = report.moved_count();
        let retained_count = patient_count - moved_count;
        let discharged_count = report
            .rows
            .iter()
            .filter(|r| r.new_place == out_place)
            .count();

        let mut occupancy_by_place = BTreeMap::new();
        for row in &report.rows {
            *occupancy_by_place.entry(row.new_place.clone()).or_insert(0) += 1;
        }

        let move_rate = if patient_count == 0 {
            0.0
        } else {
            moved_count as f64 / patient_count as f64
        };

        Self {
            patient_count,
            moved_count,
            retained_count,
            discharged_count,
            move_rate,
            occupancy_by_place,
        }
    }

    /// Whether the allocation moves at most `max_move_rate` of the patients.
    pub fn meets_threshold(&self, max_move_rate: f64) -> bool {
        self.move_rate <= max_move_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relation;

    fn report(pairs: &[(&str, &str)], old: &[(&str, &str)]) -> AllocationReport {
        let assignment: Vec<(String, String)> = pairs
            .iter()
            .map(|(p, r)| (p.to_string(), r.to_string()))
            .collect();
        AllocationReport::summarize(&assignment, &Relation::from_pairs(old.to_vec()), 0.0)
    }

    #[test]
    fn test_kpi_basic() {
        let r = report(
            &[("bb1", "r1"), ("bb2", "r2"), ("bb3", "r3"), ("bb4", "out")],
            &[("bb1", "r1"), ("bb2", "r2"), ("bb3", "r3"), ("bb4", "r4")],
        );
        let kpi = AllocationKpi::calculate(&r, "out");
        assert_eq!(kpi.patient_count, 4);
        assert_eq!(kpi.retained_count, 3);
        assert_eq!(kpi.moved_count, 1);
        assert_eq!(kpi.discharged_count, 1);
        assert!((kpi.move_rate - 0.25).abs() < 1e-10);
        assert_eq!(kpi.occupancy_by_place["out"], 1);
    }

    #[test]
    fn test_kpi_occupancy() {
        let r = report(&[("bb1", "r1"), ("bb2", "r1"), ("bb3", "r2")], &[]);
        let kpi = AllocationKpi::calculate(&r, "out");
        assert_eq!(kpi.occupancy_by_place["r1"], 2);
        assert_eq!(kpi.occupancy_by_place["r2"], 1);
        assert!((kpi.move_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = AllocationKpi::calculate(&AllocationReport::default(), "out");
        assert_eq!(kpi.patient_count, 0);
        assert!((kpi.move_rate - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_threshold() {
        let r = report(&[("bb1", "r2"), ("bb2", "r2")], &[("bb1", "r1"), ("bb2", "r2")]);
        let kpi = AllocationKpi::calculate(&r, "out");
        assert!(kpi.meets_threshold(0.5));
        assert!(!kpi.meets_threshold(0.49));
    }
}
