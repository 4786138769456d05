//! Assignment problem formulation.
//!
//! Turns a validated [`Dataset`] into an [`IlpModel`] over binary
//! variables `x[p, r]` ("patient `p` occupies place `r`") and decodes the
//! solver's answer back into placements.
//!
//! Two variants are provided:
//! - [`AllocationBuilder`]: service/treatment-aware, minimizes weighted
//!   disruption (the default).
//! - [`RetentionBuilder`]: capacity-only, maximizes retained placements.

mod retention;

pub use retention::RetentionBuilder;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AllocError, Result};
use crate::ilp::{
    IlpModel, IlpSolution, IlpSolver, LinearConstraint, Objective, Sense, SolverConfig, VarId,
};
use crate::models::Dataset;

/// Which formulation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulationVariant {
    /// Minimize priority-weighted moves under service and treatment
    /// compatibility.
    #[default]
    Disruption,
    /// Maximize patients kept in place under capacity only.
    Retention,
}

/// Patient × place grid of binary variables.
#[derive(Debug, Clone)]
pub struct AssignmentGrid {
    patients: Vec<String>,
    places: Vec<String>,
    vars: Vec<VarId>,
}

impl AssignmentGrid {
    /// Declares one binary per (patient, place) pair in `model`.
    pub fn declare(model: &mut IlpModel, patients: Vec<String>, places: Vec<String>) -> Self {
        let mut vars = Vec::with_capacity(patients.len() * places.len());
        for p in &patients {
            for r in &places {
                vars.push(model.add_binary(format!("x[{p},{r}]")));
            }
        }
        Self {
            patients,
            places,
            vars,
        }
    }

    /// Variable of the `patient`-th patient on the `place`-th place.
    pub fn var(&self, patient: usize, place: usize) -> VarId {
        self.vars[patient * self.places.len() + place]
    }

    /// Patient ids, in row order.
    pub fn patients(&self) -> &[String] {
        &self.patients
    }

    /// Place ids, in column order.
    pub fn places(&self) -> &[String] {
        &self.places
    }

    /// Index of a place.
    pub fn place_index(&self, place: &str) -> Option<usize> {
        self.places.iter().position(|r| r == place)
    }

    /// Reads the chosen place of every patient.
    ///
    /// Patients with no variable at 1 are omitted.
    pub fn decode(&self, solution: &IlpSolution, config: &SolverConfig) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.patients.len());
        for (pi, patient) in self.patients.iter().enumerate() {
            let chosen = (0..self.places.len())
                .find(|&ri| config.is_one(solution.value(self.var(pi, ri))));
            if let Some(ri) = chosen {
                out.push((patient.clone(), self.places[ri].clone()));
            }
        }
        out
    }
}

/// A built model together with its variable grid.
#[derive(Debug, Clone)]
pub struct Formulation {
    /// The integer program.
    pub model: IlpModel,
    /// Variable layout.
    pub grid: AssignmentGrid,
}

/// Solved assignment.
#[derive(Debug, Clone)]
pub struct SolvedAllocation {
    /// `(patient, place)` pairs, one per patient.
    pub assignment: Vec<(String, String)>,
    /// Objective value.
    pub objective: f64,
    /// Raw backend answer.
    pub solution: IlpSolution,
}

impl Formulation {
    /// Solves the model. Any status other than optimal/feasible is fatal.
    pub fn solve<S: IlpSolver>(&self, solver: &S, config: &SolverConfig) -> Result<SolvedAllocation> {
        let solution = solver.solve(&self.model, config);
        if !solution.is_solution_found() {
            log::error!("model '{}' ended with status {}", self.model.name, solution.status);
            return Err(AllocError::Solver {
                status: solution.status,
            });
        }
        let objective = solution
            .objective_value
            .unwrap_or_else(|| self.model.evaluate(&solution.values));
        log::info!("model '{}' solved, objective {objective}", self.model.name);
        Ok(SolvedAllocation {
            assignment: self.grid.decode(&solution, config),
            objective,
            solution,
        })
    }
}

/// Builds the disruption-minimizing assignment model.
///
/// # Variables
/// `x[p, r]` for every patient and every place of the universe (all beds
/// plus out).
///
/// # Constraints
/// - `service[p]`: exactly one new place sharing a service with `p`
/// - `treatment[p]`: exactly one new place supporting the treatment of `p`
/// - `one_place[p]`: exactly one place overall
/// - `capacity[r]`: at most `capacity(r)` patients on each new bed
///
/// # Objective
/// Minimize `Σ w(p, r)·x[p, r]` over pairs that are not the patient's old
/// allocation, with `w(p, r) = rank(s)^priority(r)` where `s` is the
/// best-ranked (lowest rank) declared service shared by `p` and `r`.
///
/// # Example
/// ```
/// use u_bedalloc::config::AllocationConfig;
/// use u_bedalloc::formulation::AllocationBuilder;
/// use u_bedalloc::models::{Dataset, Patient, Resource, ServiceCatalog};
///
/// let dataset = Dataset::new(
///     ServiceCatalog::new(["neo"]),
///     vec![Patient::new("bb1").with_service("neo").with_old_place("r1")],
///     vec![Resource::kept("r1").with_service("neo")],
///     &AllocationConfig::default(),
/// );
/// let formulation = AllocationBuilder::new(&dataset).build();
/// assert_eq!(formulation.model.variable_count(), 2); // r1, out
/// ```
pub struct AllocationBuilder<'a> {
    dataset: &'a Dataset,
}

impl<'a> AllocationBuilder<'a> {
    /// Creates a builder over a dataset.
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Builds the model.
    pub fn build(&self) -> Formulation {
        let ds = self.dataset;
        let catalog = ds.services();
        let rel = ds.relations();
        let out = ds.out_place();

        let patients: Vec<String> = ds.patients().iter().map(|p| p.id.clone()).collect();
        let places: Vec<String> = ds.place_universe().into_iter().map(str::to_string).collect();

        let mut model = IlpModel::new("alloc_model");
        let grid = AssignmentGrid::declare(&mut model, patients, places);

        let offered = rel.resource_service.grouped();
        let supported = rel.resource_treatment.grouped();
        let new_places: BTreeSet<&str> = ds.new_places().into_iter().collect();

        let exponent = |place: &str| -> u32 {
            ds.resource(place).map_or(0, |r| r.priority_exponent())
        };

        let mut objective = Vec::new();

        for (pi, patient) in ds.patients().iter().enumerate() {
            let wanted: BTreeSet<&str> = patient
                .services
                .iter()
                .map(String::as_str)
                .filter(|s| catalog.contains(s))
                .collect();
            let treatment = patient.treatment_or(&ds.config().no_treatment);

            let mut service_terms = Vec::new();
            let mut treatment_terms = Vec::new();
            let mut one_place = Vec::with_capacity(grid.places().len());

            for (ri, place) in grid.places().iter().enumerate() {
                let var = grid.var(pi, ri);
                one_place.push((var, 1.0));

                if !new_places.contains(place.as_str()) {
                    continue;
                }

                let shared: Vec<&str> = offered
                    .get(place.as_str())
                    .map(|svc| svc.iter().copied().filter(|s| wanted.contains(s)).collect())
                    .unwrap_or_default();
                if !shared.is_empty() {
                    service_terms.push((var, 1.0));
                }
                if supported
                    .get(place.as_str())
                    .is_some_and(|t| t.contains(&treatment))
                {
                    treatment_terms.push((var, 1.0));
                }

                if rel.old_allocation.contains(&patient.id, place) {
                    continue;
                }
                let exp = if place == out { 0 } else { exponent(place) };
                let matched = shared.iter().filter_map(|s| catalog.rank(s)).min();
                if let Some(rank) = matched {
                    objective.push((var, f64::from(rank.pow(exp))));
                }
            }

            let id = &patient.id;
            model.add_constraint(LinearConstraint::eq(format!("service[{id}]"), service_terms, 1.0));
            model.add_constraint(LinearConstraint::eq(
                format!("treatment[{id}]"),
                treatment_terms,
                1.0,
            ));
            model.add_constraint(LinearConstraint::eq(format!("one_place[{id}]"), one_place, 1.0));
        }

        for bed in ds.new_resources() {
            let Some(ri) = grid.place_index(&bed.id) else {
                continue;
            };
            let terms = (0..grid.patients().len())
                .map(|pi| (grid.var(pi, ri), 1.0))
                .collect();
            model.add_constraint(LinearConstraint::le(
                format!("capacity[{}]", bed.id),
                terms,
                f64::from(bed.effective_capacity()),
            ));
        }

        model.set_objective(Objective {
            sense: Sense::Minimize,
            terms: objective,
        });

        log::debug!(
            "built '{}' with {} variables and {} constraints",
            model.name,
            model.variable_count(),
            model.constraint_count()
        );
        Formulation { model, grid }
    }

    /// Builds and solves the model.
    pub fn solve<S: IlpSolver>(&self, solver: &S, config: &SolverConfig) -> Result<SolvedAllocation> {
        self.build().solve(solver, config)
    }
}

/// Per-pair objective weights of a built model, keyed by variable name.
pub fn objective_weights(model: &IlpModel) -> BTreeMap<&str, f64> {
    model
        .objective()
        .terms
        .iter()
        .map(|(v, c)| (model.variable_name(*v), *c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationConfig;
    use crate::ilp::{MicroLpSolver, SolveStatus};
    use crate::models::{Patient, Resource, ServiceCatalog};

    fn unit() -> Dataset {
        let services = ServiceCatalog::new(["neo", "rea", "leave_hospital"]);
        let patients = vec![
            Patient::new("bb1").with_service("neo").with_old_place("r1"),
            Patient::new("bb2").with_service("rea").with_old_place("r2"),
            Patient::new("bb3")
                .with_service("neo")
                .with_service("leave_hospital")
                .with_old_place("r4"),
            Patient::new("bb4")
                .with_service("leave_hospital")
                .with_old_place("r2"),
        ];
        let resources = vec![
            Resource::kept("r1").with_service("neo"),
            Resource::new("r2").old().with_service("rea"),
            Resource::new("r3")
                .new_place()
                .with_service("rea")
                .with_capacity(1)
                .with_priority(true),
            Resource::kept("r4").with_service("neo"),
        ];
        Dataset::new(services, patients, resources, &AllocationConfig::default())
    }

    #[test]
    fn test_model_shape() {
        let ds = unit();
        let f = AllocationBuilder::new(&ds).build();
        // 4 patients × (4 beds + out)
        assert_eq!(f.model.variable_count(), 20);
        // 3 per patient + capacity for r1, r3, r4
        assert_eq!(f.model.constraint_count(), 4 * 3 + 3);
        assert!(f.model.constraint("capacity[r2]").is_none());
        assert_eq!(f.grid.places(), &["r1", "r2", "r3", "r4", "out"]);
    }

    #[test]
    fn test_compatibility_rows() {
        let ds = unit();
        let f = AllocationBuilder::new(&ds).build();
        let service = f.model.constraint("service[bb2]").unwrap();
        let names: Vec<&str> = service
            .terms
            .iter()
            .map(|(v, _)| f.model.variable_name(*v))
            .collect();
        assert_eq!(names, vec!["x[bb2,r3]"]);

        let treatment = f.model.constraint("treatment[bb2]").unwrap();
        // every new place supports no_treatment; r2 is old only
        assert_eq!(treatment.terms.len(), 4);

        let leave = f.model.constraint("service[bb4]").unwrap();
        assert_eq!(leave.terms.len(), 1);
        assert_eq!(f.model.variable_name(leave.terms[0].0), "x[bb4,out]");
    }

    #[test]
    fn test_objective_weights() {
        let ds = unit();
        let f = AllocationBuilder::new(&ds).build();
        let w = objective_weights(&f.model);

        // staying put is free
        assert!(!w.contains_key("x[bb1,r1]"));
        // r3 has priority: rank(rea) = 2, 2^1
        assert_eq!(w["x[bb2,r3]"], 2.0);
        // no priority: rank^0 = 1
        assert_eq!(w["x[bb1,r4]"], 1.0);
        // out never carries priority
        assert_eq!(w["x[bb4,out]"], 1.0);
        // incompatible pairs carry no weight
        assert!(!w.contains_key("x[bb1,r3]"));
    }

    #[test]
    fn test_weight_uses_one_matched_service() {
        let services = ServiceCatalog::new(["neo", "rea", "leave_hospital"]);
        let patients = vec![Patient::new("bb1")
            .with_service("neo")
            .with_service("rea")
            .with_old_place("r0")];
        let resources = vec![
            Resource::new("r0").old().with_service("neo"),
            Resource::new("ra")
                .new_place()
                .with_service("neo")
                .with_service("rea")
                .with_capacity(1),
            Resource::new("rb")
                .new_place()
                .with_service("rea")
                .with_service("neo")
                .with_capacity(1)
                .with_priority(true),
        ];
        let ds = Dataset::new(services, patients, resources, &AllocationConfig::default());
        let f = AllocationBuilder::new(&ds).build();
        let w = objective_weights(&f.model);

        // two shared services still cost a single move
        assert_eq!(w["x[bb1,ra]"], 1.0);
        // priority uses the best-ranked shared service: rank(neo) = 1
        assert_eq!(w["x[bb1,rb]"], 1.0);

        let solved = f
            .solve(&MicroLpSolver::new(), &SolverConfig::default())
            .unwrap();
        assert!((solved.objective - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_solve_unit() {
        let ds = unit();
        let solved = AllocationBuilder::new(&ds)
            .solve(&MicroLpSolver::new(), &SolverConfig::default())
            .unwrap();
        let placed: BTreeMap<&str, &str> = solved
            .assignment
            .iter()
            .map(|(p, r)| (p.as_str(), r.as_str()))
            .collect();
        assert_eq!(placed["bb1"], "r1");
        assert_eq!(placed["bb2"], "r3");
        assert_eq!(placed["bb3"], "r4");
        assert_eq!(placed["bb4"], "out");
        assert!((solved.objective - 3.0).abs() < 1e-9);
        assert_eq!(solved.solution.status, SolveStatus::Optimal);
    }

    #[test]
    fn test_treatment_narrowing_is_infeasible() {
        let services = ServiceCatalog::new(["neo"]);
        let patients = vec![
            Patient::new("bb1").with_service("neo").with_treatment("oxygen"),
            Patient::new("bb2").with_service("neo").with_treatment("oxygen"),
        ];
        let resources = vec![
            Resource::kept("r1").with_service("neo").with_treatment("oxygen"),
            Resource::kept("r2").with_service("neo"),
        ];
        let ds = Dataset::new(services, patients, resources, &AllocationConfig::default());
        let err = AllocationBuilder::new(&ds)
            .solve(&MicroLpSolver::new(), &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AllocError::Solver {
                status: SolveStatus::Infeasible
            }
        ));
    }

    #[test]
    fn test_grid_decode() {
        let mut model = IlpModel::new("grid");
        let grid = AssignmentGrid::declare(
            &mut model,
            vec!["p1".into(), "p2".into()],
            vec!["a".into(), "b".into()],
        );
        let solution = IlpSolution {
            status: SolveStatus::Optimal,
            values: vec![0.0, 1.0, 0.0, 0.0],
            objective_value: Some(0.0),
        };
        let decoded = grid.decode(&solution, &SolverConfig::default());
        assert_eq!(decoded, vec![("p1".to_string(), "b".to_string())]);
        assert_eq!(grid.var(1, 1), VarId(3));
    }
}
