//! End-to-end allocation run: validate → formulate → solve → summarize.
//!
//! # Example
//! ```
//! use u_bedalloc::config::AllocationConfig;
//! use u_bedalloc::models::{Dataset, Patient, Resource, ServiceCatalog};
//! use u_bedalloc::pipeline::AllocationPipeline;
//! use u_bedalloc::validation::CollectingSink;
//!
//! let dataset = Dataset::new(
//!     ServiceCatalog::new(["neo"]),
//!     vec![Patient::new("bb1").with_service("neo").with_old_place("r1")],
//!     vec![Resource::kept("r1").with_service("neo")],
//!     &AllocationConfig::default(),
//! );
//! let mut sink = CollectingSink::new();
//! let outcome = AllocationPipeline::default().run(&dataset, &mut sink).unwrap();
//! assert_eq!(outcome.report.summary_line(), "0 out of 1 babies should change beds.");
//! ```

use serde::{Deserialize, Serialize};

use crate::config::AllocationConfig;
use crate::error::Result;
use crate::formulation::{AllocationBuilder, FormulationVariant, RetentionBuilder};
use crate::ilp::{IlpSolver, MicroLpSolver, SolveStatus, SolverConfig};
use crate::loader::{load_workbook, Workbook};
use crate::models::Dataset;
use crate::report::{AllocationKpi, AllocationReport};
use crate::validation::{DiagnosticSink, ValidationReport, Validator};

/// Everything a successful run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Placement report and objective value.
    pub report: AllocationReport,
    /// Report metrics.
    pub kpi: AllocationKpi,
    /// Issues found (non-empty only when forced).
    pub validation: ValidationReport,
    /// Solver status.
    pub status: SolveStatus,
}

/// Allocation pipeline over an [`IlpSolver`].
#[derive(Debug, Clone)]
pub struct AllocationPipeline<S> {
    solver: S,
    variant: FormulationVariant,
    solver_config: SolverConfig,
}

impl Default for AllocationPipeline<MicroLpSolver> {
    fn default() -> Self {
        Self::new(MicroLpSolver::new())
    }
}

impl<S: IlpSolver> AllocationPipeline<S> {
    /// Creates a pipeline solving the disruption variant with `solver`.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            variant: FormulationVariant::Disruption,
            solver_config: SolverConfig::default(),
        }
    }

    /// Selects the formulation.
    pub fn with_variant(mut self, variant: FormulationVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets the per-solve configuration.
    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Runs the pipeline on a dataset.
    ///
    /// The force switch is read from the dataset's configuration. The
    /// retention variant ignores services and skips the coherence pass.
    pub fn run(&self, dataset: &Dataset, sink: &mut dyn DiagnosticSink) -> Result<AllocationOutcome> {
        let config = dataset.config();
        let validation = Validator::new(sink)
            .with_force(config.force)
            .with_coherence(self.variant == FormulationVariant::Disruption)
            .validate(dataset)?;

        let solved = match self.variant {
            FormulationVariant::Disruption => {
                AllocationBuilder::new(dataset).solve(&self.solver, &self.solver_config)?
            }
            FormulationVariant::Retention => {
                RetentionBuilder::new(dataset).solve(&self.solver, &self.solver_config)?
            }
        };

        let report = AllocationReport::summarize(
            &solved.assignment,
            &dataset.relations().old_allocation,
            solved.objective,
        );
        let kpi = AllocationKpi::calculate(&report, dataset.out_place());
        log::info!("{}", report.summary_line());

        Ok(AllocationOutcome {
            report,
            kpi,
            validation,
            status: solved.solution.status,
        })
    }

    /// Loads a workbook and runs the pipeline on it.
    pub fn run_workbook(
        &self,
        workbook: &Workbook,
        config: &AllocationConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<AllocationOutcome> {
        let dataset = load_workbook(workbook, config)?;
        self.run(&dataset, sink)
    }
}
