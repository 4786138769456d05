//! Capacity coherence pass.
//!
//! Estimates, before any solve, whether the instance can be satisfied.
//!
//! # Fractional balance
//!
//! A patient compatible with `n` services contributes `1/n` unit of demand
//! to each of them; a new bed offering `n` services contributes `1/n` unit
//! of capacity to each, whatever its declared capacity. The discharge
//! service is excluded from both sides (its share is dropped, not
//! redistributed).
//!
//! A service is flagged when `demand - capacity >= 1`. When total demand
//! (patients that cannot leave) exceeds total new capacity (the sum of
//! declared capacities), a single global issue is raised instead, naming
//! every service with a positive deficit.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{DiagnosticSink, IssueKind, ValidationIssue, ValidationReport};
use crate::models::{Dataset, Relation};

const EPS: f64 = 1e-9;

/// Aggregated demand and capacity of one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBalance {
    /// Service name.
    pub service: String,
    /// Fractional patient demand.
    pub demand: f64,
    /// Fractional count of new beds.
    pub capacity: f64,
}

impl ServiceBalance {
    /// Demand minus capacity.
    pub fn deficit(&self) -> f64 {
        self.demand - self.capacity
    }
}

/// Splits one unit per key evenly across its values.
///
/// Returns the per-value sum, with `excluded` left out.
pub fn fractional_balance(relation: &Relation, excluded: &str) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (_, values) in relation.grouped() {
        let share = 1.0 / values.len() as f64;
        for value in values {
            if value == excluded {
                continue;
            }
            *totals.entry(value.to_string()).or_insert(0.0) += share;
        }
    }
    totals
}

/// Per-service demand and capacity, in catalog order then by name.
///
/// Services appearing on one side only are reported with 0 on the other.
pub fn service_balances(dataset: &Dataset) -> Vec<ServiceBalance> {
    let discharge = dataset.config().discharge_service.as_str();
    let rel = dataset.relations();

    let demand = fractional_balance(&rel.patient_service, discharge);

    let new_bed_services: Relation = rel
        .resource_service
        .iter()
        .filter(|(bed, _)| dataset.resource(bed).is_some_and(|r| r.is_new))
        .collect();
    let capacity = fractional_balance(&new_bed_services, discharge);

    let mut names: Vec<String> = dataset
        .services()
        .iter()
        .filter(|s| *s != discharge)
        .map(str::to_string)
        .collect();
    let extra: BTreeSet<&String> = demand
        .keys()
        .chain(capacity.keys())
        .filter(|s| !names.contains(s))
        .collect();
    let extra: Vec<String> = extra.into_iter().cloned().collect();
    names.extend(extra);

    names
        .into_iter()
        .map(|service| ServiceBalance {
            demand: demand.get(&service).copied().unwrap_or(0.0),
            capacity: capacity.get(&service).copied().unwrap_or(0.0),
            service,
        })
        .collect()
}

/// Runs the coherence pass.
pub fn coherence_control(dataset: &Dataset, sink: &mut dyn DiagnosticSink) -> ValidationReport {
    let mut report = ValidationReport::new();
    let discharge = dataset.config().discharge_service.as_str();

    let capacity = dataset.total_new_capacity();
    let need = dataset
        .patients()
        .iter()
        .filter(|p| !p.may_leave(discharge))
        .count();

    let balances = service_balances(dataset);
    for b in &balances {
        log::debug!(
            "service '{}': demand {:.2}, capacity {:.2}",
            b.service,
            b.demand,
            b.capacity
        );
    }

    if need as u64 > capacity {
        let services: Vec<String> = balances
            .iter()
            .filter(|b| b.deficit() > EPS)
            .map(|b| b.service.clone())
            .collect();
        let message = format!("Be careful, not enough beds in {services:?} service(s).");
        report.record(
            ValidationIssue::new(
                IssueKind::CapacityShortfall {
                    services,
                    need,
                    capacity,
                },
                message,
            ),
            sink,
        );
    } else {
        let services: Vec<String> = balances
            .iter()
            .filter(|b| b.deficit() >= 1.0 - EPS)
            .map(|b| b.service.clone())
            .collect();
        if !services.is_empty() {
            let message = format!(
                "Be careful, enough total nb of beds, but not enough beds in {services:?} service(s)."
            );
            report.record(
                ValidationIssue::new(IssueKind::ServiceShortfall { services }, message),
                sink,
            );
        }
    }

    report
}
