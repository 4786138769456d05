//! Referential-integrity pass.
//!
//! Checks that every relation only references declared identifiers:
//! 1. patient → service lands in the service catalog
//! 2. patient → old bed lands in the declared beds
//! 3. patient → treatment lands in the known treatments
//! 4. bed → service lands in the service catalog
//! 5. every patient has at least one compatible service
//! 6. every (service, treatment) pair a patient requires is offered by a bed

use std::collections::BTreeSet;

use super::{DiagnosticSink, IssueKind, ValidationIssue, ValidationReport};
use crate::models::{Dataset, Relation};

/// Runs the referential-integrity pass.
///
/// Never stops at the first violation: every check runs and each failure
/// becomes one issue, emitted to `sink` as soon as it is found.
pub fn map_list_control(dataset: &Dataset, sink: &mut dyn DiagnosticSink) -> ValidationReport {
    let mut report = ValidationReport::new();
    let rel = dataset.relations();

    let services = dataset.services().names();
    check_column(
        &mut report,
        sink,
        &rel.patient_service,
        "babies_service",
        "sheet 'services'",
        services,
    );

    let places = dataset.place_universe();
    check_column(
        &mut report,
        sink,
        &rel.old_allocation,
        "old_alloc_list",
        "sheet 'beds'",
        places.as_slice(),
    );

    let treatments: Vec<&str> = dataset.treatments().iter().map(String::as_str).collect();
    check_column(
        &mut report,
        sink,
        &rel.patient_treatment,
        "treatment",
        "beds treatments",
        treatments.as_slice(),
    );

    check_column(
        &mut report,
        sink,
        &rel.resource_service,
        "new_beds_service",
        "sheet 'services'",
        services,
    );

    let without_service: Vec<String> = dataset
        .patients()
        .iter()
        .filter(|p| p.services.is_empty())
        .map(|p| p.id.clone())
        .collect();
    if !without_service.is_empty() {
        let message = format!(
            "Be careful, the babies >>> {without_service:?} <<< have no compatible service."
        );
        report.record(
            ValidationIssue::new(
                IssueKind::MissingService {
                    patients: without_service,
                },
                message,
            ),
            sink,
        );
    }

    let missing = unsupported_pairs(dataset);
    if !missing.is_empty() {
        let message = format!(
            "Be careful, the pairs ('service', 'treatment') >>> {missing:?} <<< do not exist in beds data."
        );
        report.record(
            ValidationIssue::new(IssueKind::UnsupportedPair { pairs: missing }, message),
            sink,
        );
    }

    report
}

/// (service, treatment) pairs required by some patient and offered by no place.
pub(crate) fn unsupported_pairs(dataset: &Dataset) -> Vec<(String, String)> {
    let rel = dataset.relations();
    let required = rel.patient_service.align(&rel.patient_treatment);
    let offered: BTreeSet<(String, String)> =
        rel.resource_service.align(&rel.resource_treatment);
    required.difference(&offered).cloned().collect()
}

fn check_column<S: AsRef<str>>(
    report: &mut ValidationReport,
    sink: &mut dyn DiagnosticSink,
    relation: &Relation,
    column: &str,
    target: &str,
    domain: &[S],
) {
    let unknown = relation.values_outside(domain);
    if unknown.is_empty() {
        return;
    }
    let values: Vec<String> = unknown.into_iter().map(str::to_string).collect();
    let message = format!(
        "Be careful, the values >>> {values:?} <<< of column '{column}' are not declared in {target}."
    );
    report.record(
        ValidationIssue::new(
            IssueKind::UnknownReference {
                column: column.to_string(),
                target: target.to_string(),
                values,
            },
            message,
        ),
        sink,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationConfig;
    use crate::models::{Patient, Resource, ServiceCatalog};
    use crate::validation::{CollectingSink, IssueCategory};

    fn dataset(patients: Vec<Patient>, resources: Vec<Resource>) -> Dataset {
        Dataset::new(
            ServiceCatalog::new(["neo", "rea", "leave_hospital"]),
            patients,
            resources,
            &AllocationConfig::default(),
        )
    }

    #[test]
    fn test_clean_dataset() {
        let ds = dataset(
            vec![Patient::new("bb1").with_service("neo").with_old_place("r1")],
            vec![Resource::kept("r1").with_service("neo")],
        );
        let mut sink = CollectingSink::new();
        let report = map_list_control(&ds, &mut sink);
        assert!(report.is_valid());
    }

    #[test]
    fn test_unknown_old_bed_names_exactly_that_id() {
        let ds = dataset(
            vec![
                Patient::new("bb1").with_service("neo").with_old_place("r1"),
                Patient::new("bb2").with_service("neo").with_old_place("r42"),
            ],
            vec![Resource::kept("r1").with_service("neo").with_capacity(2)],
        );
        let mut sink = CollectingSink::new();
        let report = map_list_control(&ds, &mut sink);

        assert!(!report.is_valid());
        assert_eq!(report.len(), 1);
        match &report.issues[0].kind {
            IssueKind::UnknownReference { column, values, .. } => {
                assert_eq!(column, "old_alloc_list");
                assert_eq!(values, &vec!["r42".to_string()]);
            }
            other => panic!("unexpected issue {other:?}"),
        }
        assert!(sink.messages()[0].contains("r42"));
        assert!(!sink.messages()[0].contains("r1\""));
    }

    #[test]
    fn test_collects_every_violation() {
        let ds = dataset(
            vec![
                Patient::new("bb1")
                    .with_service("ghost")
                    .with_treatment("laser")
                    .with_old_place("r9"),
                Patient::new("bb2"),
            ],
            vec![Resource::kept("r1").with_service("phantom")],
        );
        let mut sink = CollectingSink::new();
        let report = map_list_control(&ds, &mut sink);

        let columns: Vec<&str> = report
            .issues
            .iter()
            .filter_map(|i| match &i.kind {
                IssueKind::UnknownReference { column, .. } => Some(column.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            columns,
            vec!["babies_service", "old_alloc_list", "treatment", "new_beds_service"]
        );
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i.kind, IssueKind::MissingService { .. })));
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i.kind, IssueKind::UnsupportedPair { .. })));
        assert!(report
            .issues
            .iter()
            .all(|i| i.category() == IssueCategory::Mapping));
        assert_eq!(sink.issues.len(), report.len());
    }

    #[test]
    fn test_unsupported_pair_listed_verbatim() {
        let ds = dataset(
            vec![
                Patient::new("bb1")
                    .with_service("rea")
                    .with_treatment("oxygen")
                    .with_old_place("r1"),
            ],
            vec![
                Resource::kept("r1").with_service("rea"),
                Resource::kept("r2").with_service("neo").with_treatment("oxygen"),
            ],
        );
        let pairs = unsupported_pairs(&ds);
        assert_eq!(pairs, vec![("rea".to_string(), "oxygen".to_string())]);

        let mut sink = CollectingSink::new();
        let report = map_list_control(&ds, &mut sink);
        assert_eq!(report.len(), 1);
        assert!(report.issues[0].message.contains("(\"rea\", \"oxygen\")"));
    }

    #[test]
    fn test_no_treatment_patients_fit_any_bed() {
        let ds = dataset(
            vec![Patient::new("bb1").with_service("neo").with_old_place("r1")],
            vec![Resource::kept("r1").with_service("neo").with_treatment("oxygen")],
        );
        assert!(unsupported_pairs(&ds).is_empty());
    }
}
