//! Binary integer linear programs.
//!
//! A solver-independent representation of the assignment problem: indexed
//! binary variables, linear constraints and a linear objective. Any ILP
//! backend can be plugged in through [`IlpSolver`]; [`MicroLpSolver`] is the
//! bundled pure-Rust implementation.
//!
//! # Reference
//! Wolsey (2020), "Integer Programming", Ch. 1

mod microlp;

pub use self::microlp::MicroLpSolver;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a variable in its [`IlpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// `lhs == rhs`
    Eq,
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
}

/// `Σ coef·x  (op)  rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Constraint name (for diagnostics).
    pub name: String,
    /// Non-zero coefficients.
    pub terms: Vec<(VarId, f64)>,
    /// Comparison operator.
    pub op: Comparison,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Creates an equality constraint.
    pub fn eq(name: impl Into<String>, terms: Vec<(VarId, f64)>, rhs: f64) -> Self {
        Self {
            name: name.into(),
            terms,
            op: Comparison::Eq,
            rhs,
        }
    }

    /// Creates a `<=` constraint.
    pub fn le(name: impl Into<String>, terms: Vec<(VarId, f64)>, rhs: f64) -> Self {
        Self {
            name: name.into(),
            terms,
            op: Comparison::Le,
            rhs,
        }
    }

    /// Creates a `>=` constraint.
    pub fn ge(name: impl Into<String>, terms: Vec<(VarId, f64)>, rhs: f64) -> Self {
        Self {
            name: name.into(),
            terms,
            op: Comparison::Ge,
            rhs,
        }
    }

    /// Left-hand side under a variable assignment.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[v.0]).sum()
    }

    /// Whether the assignment satisfies the constraint (within `tol`).
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.lhs(values);
        match self.op {
            Comparison::Eq => (lhs - self.rhs).abs() <= tol,
            Comparison::Le => lhs <= self.rhs + tol,
            Comparison::Ge => lhs >= self.rhs - tol,
        }
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    /// Minimize the objective.
    Minimize,
    /// Maximize the objective.
    Maximize,
}

/// Linear objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Optimization direction.
    pub sense: Sense,
    /// Non-zero coefficients.
    pub terms: Vec<(VarId, f64)>,
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            sense: Sense::Minimize,
            terms: Vec::new(),
        }
    }
}

/// A binary integer program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IlpModel {
    /// Model name.
    pub name: String,
    variables: Vec<String>,
    constraints: Vec<LinearConstraint>,
    objective: Objective,
}

impl IlpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declares a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.variables.push(name.into());
        VarId(self.variables.len() - 1)
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Sets the objective.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    /// Variable names, indexed by [`VarId`].
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Name of a variable.
    pub fn variable_name(&self, var: VarId) -> &str {
        &self.variables[var.0]
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Looks up a constraint by name.
    pub fn constraint(&self, name: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Objective value under a variable assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .terms
            .iter()
            .map(|(v, c)| c * values[v.0])
            .sum()
    }

    /// Names of the constraints violated by an assignment.
    pub fn violated_constraints(&self, values: &[f64], tol: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tol))
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Outcome class of a solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Feasible, optimality not proven.
    Feasible,
    /// No integer solution exists.
    Infeasible,
    /// Objective unbounded.
    Unbounded,
    /// Backend-specific failure.
    Other(String),
}

impl SolveStatus {
    /// Whether the status carries a usable assignment.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "Optimal"),
            Self::Feasible => write!(f, "Integer"),
            Self::Infeasible => write!(f, "IntegerInfeasible"),
            Self::Unbounded => write!(f, "Unbounded"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Result returned by an [`IlpSolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlpSolution {
    /// Outcome class.
    pub status: SolveStatus,
    /// Variable levels, indexed by [`VarId`]. Empty unless successful.
    pub values: Vec<f64>,
    /// Objective value. `None` unless successful.
    pub objective_value: Option<f64>,
}

impl IlpSolution {
    /// Creates an unsuccessful solution.
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
        }
    }

    /// Whether a usable assignment was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.is_success()
    }

    /// Level of a variable (0 when unknown).
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }
}

/// Per-solve configuration, passed opaquely to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Level above which a binary variable reads as 1.
    pub binary_threshold: f64,
    /// Log model statistics at debug level before solving.
    pub log_model: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 0.5,
            log_model: false,
        }
    }
}

impl SolverConfig {
    /// Whether a level reads as 1.
    pub fn is_one(&self, level: f64) -> bool {
        level > self.binary_threshold
    }
}

/// An ILP backend.
pub trait IlpSolver {
    /// Solves `model`. Never panics on infeasible or unbounded input;
    /// these are reported through [`IlpSolution::status`].
    fn solve(&self, model: &IlpModel, config: &SolverConfig) -> IlpSolution;
}
