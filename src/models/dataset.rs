//! Assembled input of one allocation run.
//!
//! A [`Dataset`] owns the declared entities and the five canonical
//! relations derived from them. It is built once, validated, then treated
//! as read-only input by the formulator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Patient, Relation, Resource, ServiceCatalog};
use crate::config::AllocationConfig;

/// The canonical relations of the data model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relations {
    /// patient → compatible service.
    pub patient_service: Relation,
    /// patient → required treatment (sentinel when none).
    pub patient_treatment: Relation,
    /// patient → bed occupied before the reconfiguration.
    pub old_allocation: Relation,
    /// place → offered service (includes the out pseudo-resource).
    pub resource_service: Relation,
    /// place → supported treatment (includes the out pseudo-resource).
    pub resource_treatment: Relation,
}

/// Entities and relations of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    services: ServiceCatalog,
    patients: Vec<Patient>,
    resources: Vec<Resource>,
    out_services: Vec<String>,
    treatments: BTreeSet<String>,
    relations: Relations,
    config: AllocationConfig,
}

impl Dataset {
    /// Assembles a dataset and derives its relations.
    ///
    /// A resource whose id equals the configured out place is folded into
    /// the discharge pseudo-resource: its services are added to the ones
    /// the pseudo-resource offers, its other attributes are ignored.
    pub fn new(
        services: ServiceCatalog,
        patients: Vec<Patient>,
        resources: Vec<Resource>,
        config: &AllocationConfig,
    ) -> Self {
        let mut out_services = Vec::new();
        if services.contains(&config.discharge_service) {
            out_services.push(config.discharge_service.clone());
        }
        let mut beds = Vec::with_capacity(resources.len());
        for resource in resources {
            if resource.id == config.out_place {
                for s in resource.services {
                    if !out_services.contains(&s) {
                        out_services.push(s);
                    }
                }
            } else {
                beds.push(resource);
            }
        }

        let mut treatments: BTreeSet<String> = BTreeSet::new();
        treatments.insert(config.no_treatment.clone());
        for bed in &beds {
            treatments.extend(bed.treatments.iter().cloned());
        }

        let relations = Relations {
            patient_service: patients
                .iter()
                .flat_map(|p| p.services.iter().map(move |s| (p.id.as_str(), s.as_str())))
                .collect(),
            patient_treatment: patients
                .iter()
                .map(|p| (p.id.as_str(), p.treatment_or(&config.no_treatment)))
                .collect(),
            old_allocation: patients
                .iter()
                .filter_map(|p| p.old_place.as_deref().map(|o| (p.id.as_str(), o)))
                .collect(),
            resource_service: beds
                .iter()
                .flat_map(|r| r.services.iter().map(move |s| (r.id.as_str(), s.as_str())))
                .chain(
                    out_services
                        .iter()
                        .map(|s| (config.out_place.as_str(), s.as_str())),
                )
                .collect(),
            resource_treatment: beds
                .iter()
                .flat_map(|r| {
                    r.treatments
                        .iter()
                        .map(String::as_str)
                        .chain(std::iter::once(config.no_treatment.as_str()))
                        .map(move |t| (r.id.as_str(), t))
                })
                .chain(
                    treatments
                        .iter()
                        .map(|t| (config.out_place.as_str(), t.as_str())),
                )
                .collect(),
        };

        Self {
            services,
            patients,
            resources: beds,
            out_services,
            treatments,
            relations,
            config: config.clone(),
        }
    }

    /// Declared services, in rank order.
    pub fn services(&self) -> &ServiceCatalog {
        &self.services
    }

    /// Declared patients.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Declared beds (the out pseudo-resource excluded).
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Derived relations.
    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    /// Known treatments: the sentinel plus every treatment a bed offers.
    pub fn treatments(&self) -> &BTreeSet<String> {
        &self.treatments
    }

    /// Configuration the dataset was assembled with.
    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Identifier of the discharge pseudo-resource.
    pub fn out_place(&self) -> &str {
        &self.config.out_place
    }

    /// Services offered by the discharge pseudo-resource.
    pub fn out_services(&self) -> &[String] {
        &self.out_services
    }

    /// Looks up a bed.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Looks up a patient.
    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Beds available after the reconfiguration.
    pub fn new_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_new)
    }

    /// Beds that existed before the reconfiguration.
    pub fn old_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_old)
    }

    /// Beds marked as leaving the unit.
    pub fn leaving_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.going_out)
    }

    /// Places a patient may end up in: new beds, then out.
    pub fn new_places(&self) -> Vec<&str> {
        self.new_resources()
            .map(|r| r.id.as_str())
            .chain(std::iter::once(self.out_place()))
            .collect()
    }

    /// Every place a patient may be indexed on: all beds, then out.
    pub fn place_universe(&self) -> Vec<&str> {
        self.resources
            .iter()
            .map(|r| r.id.as_str())
            .chain(std::iter::once(self.out_place()))
            .collect()
    }

    /// Whether `place` is a new bed or the out pseudo-resource.
    pub fn is_new_place(&self, place: &str) -> bool {
        place == self.out_place() || self.resource(place).is_some_and(|r| r.is_new)
    }

    /// Total capacity of new beds (undeclared capacities count as 0).
    pub fn total_new_capacity(&self) -> u64 {
        self.new_resources()
            .map(|r| u64::from(r.effective_capacity()))
            .sum()
    }
}
