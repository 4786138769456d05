//! Capacity-only retention model.
//!
//! Ignores services and treatments: every patient takes one new place,
//! every new bed holds at most its capacity (1 when undeclared) and the
//! out place is unbounded. Maximizes the number of patients whose old bed
//! is kept.

use super::{AssignmentGrid, Formulation, SolvedAllocation};
use crate::error::Result;
use crate::ilp::{IlpModel, IlpSolver, LinearConstraint, Objective, Sense, SolverConfig};
use crate::models::Dataset;

/// Builds the retention-maximizing model.
///
/// # Example
/// ```
/// use u_bedalloc::config::AllocationConfig;
/// use u_bedalloc::formulation::RetentionBuilder;
/// use u_bedalloc::models::{Dataset, Patient, Resource, ServiceCatalog};
///
/// let dataset = Dataset::new(
///     ServiceCatalog::new(["neo"]),
///     vec![Patient::new("bb1").with_old_place("r1")],
///     vec![Resource::kept("r1")],
///     &AllocationConfig::default(),
/// );
/// let model = RetentionBuilder::new(&dataset).build().model;
/// assert_eq!(model.objective().terms.len(), 1);
/// ```
pub struct RetentionBuilder<'a> {
    dataset: &'a Dataset,
}

impl<'a> RetentionBuilder<'a> {
    /// Creates a builder over a dataset.
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Builds the model.
    pub fn build(&self) -> Formulation {
        let ds = self.dataset;
        let patients: Vec<String> = ds.patients().iter().map(|p| p.id.clone()).collect();
        let places: Vec<String> = ds.new_places().into_iter().map(str::to_string).collect();

        let mut model = IlpModel::new("retention_model");
        let grid = AssignmentGrid::declare(&mut model, patients, places);

        let mut kept = Vec::new();
        for (pi, patient) in ds.patients().iter().enumerate() {
            let terms = (0..grid.places().len())
                .map(|ri| (grid.var(pi, ri), 1.0))
                .collect();
            model.add_constraint(LinearConstraint::eq(
                format!("has_place[{}]", patient.id),
                terms,
                1.0,
            ));

            let old = patient
                .old_place
                .as_deref()
                .filter(|o| ds.resource(o).is_some_and(|r| r.is_kept()));
            if let Some(ri) = old.and_then(|o| grid.place_index(o)) {
                kept.push((grid.var(pi, ri), 1.0));
            }
        }

        for bed in ds.new_resources() {
            let Some(ri) = grid.place_index(&bed.id) else {
                continue;
            };
            let terms = (0..grid.patients().len())
                .map(|pi| (grid.var(pi, ri), 1.0))
                .collect();
            model.add_constraint(LinearConstraint::le(
                format!("room[{}]", bed.id),
                terms,
                f64::from(bed.capacity.unwrap_or(1)),
            ));
        }

        model.set_objective(Objective {
            sense: Sense::Maximize,
            terms: kept,
        });
        Formulation { model, grid }
    }

    /// Builds and solves the model.
    pub fn solve<S: IlpSolver>(&self, solver: &S, config: &SolverConfig) -> Result<SolvedAllocation> {
        self.build().solve(solver, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationConfig;
    use crate::ilp::MicroLpSolver;
    use crate::models::{Patient, Resource, ServiceCatalog};
    use std::collections::BTreeMap;

    /// Four babies, r4 closes, r3 opens with a single place.
    fn unit() -> Dataset {
        let patients = vec![
            Patient::new("bb1").with_service("neo").with_old_place("r1"),
            Patient::new("bb2").with_service("neo").with_old_place("r2"),
            Patient::new("bb3").with_service("neo").with_old_place("r4"),
            Patient::new("bb4").with_service("neo").with_old_place("r4"),
        ];
        let resources = vec![
            Resource::kept("r1"),
            Resource::kept("r2"),
            Resource::new("r3").new_place(),
            Resource::new("r4").old().leaving().with_capacity(2),
        ];
        Dataset::new(
            ServiceCatalog::new(["neo"]),
            patients,
            resources,
            &AllocationConfig::default(),
        )
    }

    #[test]
    fn test_shape() {
        let ds = unit();
        let f = RetentionBuilder::new(&ds).build();
        // r1, r2, r3, out
        assert_eq!(f.grid.places(), &["r1", "r2", "r3", "out"]);
        assert_eq!(f.model.variable_count(), 16);
        assert!(f.model.constraint("room[r3]").is_some());
        assert!(f.model.constraint("room[out]").is_none());
        assert_eq!(f.model.constraint("room[r3]").unwrap().rhs, 1.0);
        // r4 is not kept, so bb3 and bb4 carry no retention term
        assert_eq!(f.model.objective().terms.len(), 2);
    }

    #[test]
    fn test_solve_keeps_kept_beds() {
        let ds = unit();
        let solved = RetentionBuilder::new(&ds)
            .solve(&MicroLpSolver::new(), &SolverConfig::default())
            .unwrap();
        let placed: BTreeMap<&str, &str> = solved
            .assignment
            .iter()
            .map(|(p, r)| (p.as_str(), r.as_str()))
            .collect();
        assert_eq!(placed["bb1"], "r1");
        assert_eq!(placed["bb2"], "r2");
        assert!((solved.objective - 2.0).abs() < 1e-9);

        let r3 = placed.values().filter(|r| **r == "r3").count();
        let out = placed.values().filter(|r| **r == "out").count();
        assert!(r3 <= 1);
        assert_eq!(r3 + out, 2);
    }
}
