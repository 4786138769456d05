//! Pure-Rust backend built on `good_lp` with the `microlp` solver.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};

use super::{
    Comparison, IlpModel, IlpSolution, IlpSolver, Sense, SolveStatus, SolverConfig, VarId,
};

const TOLERANCE: f64 = 1e-6;

/// Branch-and-bound MILP solver (`good_lp` + `microlp`).
///
/// Suited to unit-sized instances (tens of patients, tens of beds). Binary
/// levels are rounded with [`SolverConfig::binary_threshold`] and the
/// objective is re-evaluated on the rounded assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl MicroLpSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

fn expression(terms: &[(VarId, f64)], handles: &[Variable]) -> Expression {
    let mut expr = Expression::with_capacity(terms.len());
    for &(var, coef) in terms {
        expr.add_mul(coef, handles[var.0]);
    }
    expr
}

impl IlpSolver for MicroLpSolver {
    fn solve(&self, model: &IlpModel, config: &SolverConfig) -> IlpSolution {
        if config.log_model {
            log::debug!(
                "solving '{}': {} binaries, {} constraints, {} objective terms",
                model.name,
                model.variable_count(),
                model.constraint_count(),
                model.objective().terms.len()
            );
        }

        // Empty rows never reach the backend.
        for c in model.constraints().iter().filter(|c| c.terms.is_empty()) {
            if !c.is_satisfied(&[], TOLERANCE) {
                log::debug!("constraint '{}' has no candidate variable", c.name);
                return IlpSolution::failed(SolveStatus::Infeasible);
            }
        }
        if model.variable_count() == 0 {
            return IlpSolution {
                status: SolveStatus::Optimal,
                values: Vec::new(),
                objective_value: Some(0.0),
            };
        }

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = (0..model.variable_count())
            .map(|_| vars.add(variable().binary()))
            .collect();

        let objective = expression(&model.objective().terms, &handles);
        let unsolved = match model.objective().sense {
            Sense::Minimize => vars.minimise(objective),
            Sense::Maximize => vars.maximise(objective),
        };
        let mut problem = unsolved.using(default_solver);

        for c in model.constraints().iter().filter(|c| !c.terms.is_empty()) {
            let lhs = expression(&c.terms, &handles);
            let row = match c.op {
                Comparison::Eq => constraint::eq(lhs, c.rhs),
                Comparison::Le => constraint::leq(lhs, c.rhs),
                Comparison::Ge => constraint::geq(lhs, c.rhs),
            };
            problem = problem.with(row);
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = handles
                    .iter()
                    .map(|&v| if config.is_one(solution.value(v)) { 1.0 } else { 0.0 })
                    .collect();
                let violated = model.violated_constraints(&values, TOLERANCE);
                if !violated.is_empty() {
                    return IlpSolution::failed(SolveStatus::Other(format!(
                        "rounded solution violates {}",
                        violated.join(", ")
                    )));
                }
                IlpSolution {
                    status: SolveStatus::Optimal,
                    objective_value: Some(model.evaluate(&values)),
                    values,
                }
            }
            Err(ResolutionError::Infeasible) => IlpSolution::failed(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => IlpSolution::failed(SolveStatus::Unbounded),
            Err(other) => IlpSolution::failed(SolveStatus::Other(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilp::{LinearConstraint, Objective};

    fn pick_one(sense: Sense) -> IlpModel {
        let mut m = IlpModel::new("pick");
        let a = m.add_binary("a");
        let b = m.add_binary("b");
        let c = m.add_binary("c");
        m.add_constraint(LinearConstraint::eq(
            "exactly_one",
            vec![(a, 1.0), (b, 1.0), (c, 1.0)],
            1.0,
        ));
        m.set_objective(Objective {
            sense,
            terms: vec![(a, 3.0), (b, 1.0), (c, 2.0)],
        });
        m
    }

    #[test]
    fn test_minimize() {
        let sol = MicroLpSolver::new().solve(&pick_one(Sense::Minimize), &SolverConfig::default());
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.values, vec![0.0, 1.0, 0.0]);
        assert!((sol.objective_value.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_maximize() {
        let sol = MicroLpSolver::new().solve(&pick_one(Sense::Maximize), &SolverConfig::default());
        assert_eq!(sol.values, vec![1.0, 0.0, 0.0]);
        assert!((sol.objective_value.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        let mut m = pick_one(Sense::Minimize);
        m.add_constraint(LinearConstraint::le(
            "none",
            vec![(VarId(0), 1.0), (VarId(1), 1.0), (VarId(2), 1.0)],
            0.0,
        ));
        let sol = MicroLpSolver::new().solve(&m, &SolverConfig::default());
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert!(!sol.is_solution_found());
    }

    #[test]
    fn test_empty_row_is_infeasible() {
        let mut m = pick_one(Sense::Minimize);
        m.add_constraint(LinearConstraint::eq("nothing_fits", vec![], 1.0));
        let sol = MicroLpSolver::new().solve(&m, &SolverConfig::default());
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_empty_model() {
        let sol = MicroLpSolver::new().solve(&IlpModel::new("empty"), &SolverConfig::default());
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective_value, Some(0.0));
    }
}
