//! Pre-solve validation of allocation datasets.
//!
//! Two independent passes, each collecting every violation before
//! reporting:
//! - [`map_list_control`]: referential integrity of the relations and
//!   (service, treatment) pair support.
//! - [`coherence_control`]: capacity-based estimate of integer infeasibility.
//!
//! Issues are returned as a [`ValidationReport`] value and mirrored to a
//! caller-supplied [`DiagnosticSink`]. Whether they are fatal is decided by
//! [`Validator`] according to the force override.

mod coherence;
mod mapping;

pub use coherence::{coherence_control, fractional_balance, service_balances, ServiceBalance};
pub use mapping::map_list_control;

use serde::{Deserialize, Serialize};

use crate::error::{AllocError, Result};
use crate::models::Dataset;

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Plausible problem (e.g. infeasibility risk).
    Warning,
    /// The data is malformed.
    Error,
}

/// Which pass raised an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    /// Referential integrity.
    Mapping,
    /// Capacity coherence.
    Coherence,
}

/// Typed description of an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Values of a foreign-key column are absent from their target set.
    UnknownReference {
        column: String,
        target: String,
        values: Vec<String>,
    },
    /// Patients declared without any compatible service.
    MissingService { patients: Vec<String> },
    /// (service, treatment) pairs required by patients but offered by no bed.
    UnsupportedPair { pairs: Vec<(String, String)> },
    /// More patients need a bed than new beds exist.
    CapacityShortfall {
        services: Vec<String>,
        need: usize,
        capacity: u64,
    },
    /// Enough beds overall, but some services are short by at least one.
    ServiceShortfall { services: Vec<String> },
}

impl IssueKind {
    /// Pass the issue belongs to.
    pub fn category(&self) -> IssueCategory {
        match self {
            Self::UnknownReference { .. }
            | Self::MissingService { .. }
            | Self::UnsupportedPair { .. } => IssueCategory::Mapping,
            Self::CapacityShortfall { .. } | Self::ServiceShortfall { .. } => {
                IssueCategory::Coherence
            }
        }
    }
}

/// A validation issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Typed payload.
    pub kind: IssueKind,
    /// Severity.
    pub severity: Severity,
    /// Human-readable diagnostic.
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        let severity = match kind.category() {
            IssueCategory::Mapping => Severity::Error,
            IssueCategory::Coherence => Severity::Warning,
        };
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }

    /// Pass the issue belongs to.
    pub fn category(&self) -> IssueCategory {
        self.kind.category()
    }
}

/// Outcome of one or more validation passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Issues in detection order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no issue was found.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether the report holds no issue.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues raised by a given pass.
    pub fn in_category(&self, category: IssueCategory) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.category() == category)
    }

    /// Appends the issues of another report.
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    fn record(&mut self, issue: ValidationIssue, sink: &mut dyn DiagnosticSink) {
        sink.emit(&issue);
        self.issues.push(issue);
    }
}

/// Destination for validation diagnostics.
///
/// Passed explicitly into each pass so that concurrent runs in one process
/// keep separate diagnostic streams.
pub trait DiagnosticSink {
    /// Receives one issue, at the moment it is detected.
    fn emit(&mut self, issue: &ValidationIssue);
}

/// Forwards every issue to the `log` facade at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, issue: &ValidationIssue) {
        log::warn!("{}", issue.message);
    }
}

/// Keeps issues in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// Received issues.
    pub issues: Vec<ValidationIssue>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Received messages.
    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&mut self, issue: &ValidationIssue) {
        self.issues.push(issue.clone());
    }
}

/// Runs both passes and applies the force override.
///
/// Without force, mapping issues stop the run before the coherence pass
/// ([`AllocError::Mapping`]) and coherence issues stop it before any solve
/// ([`AllocError::Incoherent`]). With force, every issue is still emitted
/// and returned in the report.
pub struct Validator<'a> {
    sink: &'a mut dyn DiagnosticSink,
    force: bool,
    coherence: bool,
}

impl<'a> Validator<'a> {
    /// Creates a validator writing to `sink`.
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            sink,
            force: false,
            coherence: true,
        }
    }

    /// Sets the force override.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Enables or disables the coherence pass (enabled by default).
    pub fn with_coherence(mut self, coherence: bool) -> Self {
        self.coherence = coherence;
        self
    }

    /// Validates a dataset.
    pub fn validate(&mut self, dataset: &Dataset) -> Result<ValidationReport> {
        let mut report = map_list_control(dataset, self.sink);
        if !report.is_valid() {
            if !self.force {
                return Err(AllocError::Mapping {
                    issues: report.len(),
                });
            }
            log::warn!(
                "Mapping control found {} issue(s); continuing because force is set.",
                report.len()
            );
        }

        if !self.coherence {
            return Ok(report);
        }

        let coherence = coherence_control(dataset, self.sink);
        if !coherence.is_valid() {
            if !self.force {
                return Err(AllocError::Incoherent {
                    issues: coherence.len(),
                });
            }
            log::warn!(
                "Coherence control found {} issue(s); continuing because force is set.",
                coherence.len()
            );
        }

        report.merge(coherence);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationConfig;
    use crate::models::{Patient, Resource, ServiceCatalog};

    fn valid_dataset() -> Dataset {
        let services = ServiceCatalog::new(["neo", "rea", "leave_hospital"]);
        let patients = vec![
            Patient::new("bb1").with_service("neo").with_old_place("r1"),
            Patient::new("bb2").with_service("rea").with_old_place("r2"),
            Patient::new("bb3")
                .with_service("leave_hospital")
                .with_old_place("r3"),
        ];
        let resources = vec![
            Resource::kept("r1").with_service("neo"),
            Resource::kept("r2").with_service("rea"),
            Resource::new("r3").old().with_service("neo"),
        ];
        Dataset::new(services, patients, resources, &AllocationConfig::default())
    }

    fn broken_mapping() -> Dataset {
        let services = ServiceCatalog::new(["neo"]);
        let patients = vec![Patient::new("bb1").with_service("ghost").with_old_place("r1")];
        let resources = vec![Resource::kept("r1").with_service("neo")];
        Dataset::new(services, patients, resources, &AllocationConfig::default())
    }

    fn short_capacity() -> Dataset {
        let services = ServiceCatalog::new(["neo"]);
        let patients = vec![
            Patient::new("bb1").with_service("neo").with_old_place("r1"),
            Patient::new("bb2").with_service("neo").with_old_place("r2"),
        ];
        let resources = vec![
            Resource::kept("r1").with_service("neo"),
            Resource::new("r2").old().with_service("neo"),
        ];
        Dataset::new(services, patients, resources, &AllocationConfig::default())
    }

    #[test]
    fn test_valid_dataset_passes() {
        let ds = valid_dataset();
        let mut sink = CollectingSink::new();
        let report = Validator::new(&mut sink).validate(&ds).unwrap();
        assert!(report.is_valid());
        assert!(sink.issues.is_empty());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let ds = valid_dataset();
        let mut sink = CollectingSink::new();
        let first = Validator::new(&mut sink).validate(&ds).unwrap();
        let second = Validator::new(&mut sink).validate(&ds).unwrap();
        assert_eq!(first, second);
        assert!(sink.issues.is_empty());
    }

    #[test]
    fn test_mapping_error_without_force() {
        let ds = broken_mapping();
        let mut sink = CollectingSink::new();
        let err = Validator::new(&mut sink).validate(&ds).unwrap_err();
        assert!(matches!(err, AllocError::Mapping { .. }));
        assert!(!sink.issues.is_empty());
    }

    #[test]
    fn test_force_keeps_warnings_observable() {
        let ds = broken_mapping();
        let mut sink = CollectingSink::new();
        let report = Validator::new(&mut sink)
            .with_force(true)
            .validate(&ds)
            .unwrap();
        assert!(!report.is_valid());
        assert_eq!(sink.issues.len(), report.len());
        assert!(report.in_category(IssueCategory::Mapping).count() > 0);
    }

    #[test]
    fn test_incoherent_is_distinct_from_mapping() {
        let ds = short_capacity();
        let mut sink = CollectingSink::new();
        let err = Validator::new(&mut sink).validate(&ds).unwrap_err();
        assert!(matches!(err, AllocError::Incoherent { .. }));
        assert_eq!(sink.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_coherence_pass_can_be_skipped() {
        let ds = short_capacity();
        let mut sink = CollectingSink::new();
        let report = Validator::new(&mut sink)
            .with_coherence(false)
            .validate(&ds)
            .unwrap();
        assert!(report.is_valid());
        assert!(sink.issues.is_empty());
    }

    #[test]
    fn test_issue_categories() {
        let kind = IssueKind::UnsupportedPair { pairs: vec![] };
        assert_eq!(kind.category(), IssueCategory::Mapping);
        let kind = IssueKind::ServiceShortfall { services: vec![] };
        assert_eq!(kind.category(), IssueCategory::Coherence);
    }
}
