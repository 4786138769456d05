//! Bed reallocation for care units.
//!
//! Reassigns patients ("babies") to beds after a unit reconfiguration,
//! respecting service and treatment compatibility and bed capacity while
//! minimizing priority-weighted moves.
//!
//! # Modules
//!
//! - **`models`**: Domain types (`Patient`, `Resource`, `ServiceCatalog`,
//!   `Relation`, `Dataset`)
//! - **`loader`**: JSON workbook reading and schema checks
//! - **`validation`**: Referential integrity and capacity coherence passes
//! - **`ilp`**: Binary integer programs and the `IlpSolver` seam
//! - **`formulation`**: Assignment model builders (disruption, retention)
//! - **`report`**: Placement report and allocation KPIs
//! - **`pipeline`**: validate → formulate → solve → summarize
//!
//! # Pipeline
//!
//! ```text
//! Workbook ──load──► Dataset ──validate──► AllocationBuilder ──solve──► AllocationReport
//!                                 │                                 │
//!                          DiagnosticSink                       IlpSolver
//! ```
//!
//! # References
//!
//! - Wolsey (2020), "Integer Programming"
//! - Pentico (2007), "Assignment problems: A golden anniversary survey"

pub mod config;
pub mod error;
pub mod formulation;
pub mod ilp;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod validation;
