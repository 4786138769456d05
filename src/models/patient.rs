//! Patient (baby) model.
//!
//! A patient is the entity being placed. It can go to any bed offering one
//! of its compatible services and supporting its treatment, or leave the
//! unit when the discharge service is among its compatible services.

use serde::{Deserialize, Serialize};

/// A patient to be (re)allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Unique patient identifier.
    pub id: String,
    /// Compatible services, in the order they were listed.
    pub services: Vec<String>,
    /// Required treatment. `None` means no treatment is required.
    pub treatment: Option<String>,
    /// Bed occupied before the reconfiguration. `None` for new admissions.
    pub old_place: Option<String>,
}

impl Patient {
    /// Creates a patient with no services, treatment or prior bed.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            services: Vec::new(),
            treatment: None,
            old_place: None,
        }
    }

    /// Adds a compatible service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        let service = service.into();
        if !self.services.contains(&service) {
            self.services.push(service);
        }
        self
    }

    /// Sets the required treatment.
    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    /// Sets the bed occupied before the reconfiguration.
    pub fn with_old_place(mut self, place: impl Into<String>) -> Self {
        self.old_place = Some(place.into());
        self
    }

    /// Whether the patient may be discharged (has the discharge service).
    pub fn may_leave(&self, discharge_service: &str) -> bool {
        self.services.iter().any(|s| s == discharge_service)
    }

    /// Effective treatment, substituting the "no treatment" sentinel.
    pub fn treatment_or<'a>(&'a self, no_treatment: &'a str) -> &'a str {
        self.treatment.as_deref().unwrap_or(no_treatment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_builder() {
        let p = Patient::new("bb1")
            .with_service("neo")
            .with_service("rea")
            .with_service("neo")
            .with_treatment("oxygen")
            .with_old_place("r1");

        assert_eq!(p.id, "bb1");
        assert_eq!(p.services, vec!["neo", "rea"]);
        assert_eq!(p.treatment.as_deref(), Some("oxygen"));
        assert_eq!(p.old_place.as_deref(), Some("r1"));
    }

    #[test]
    fn test_may_leave() {
        let p = Patient::new("bb1").with_service("neo").with_service("leave_hospital");
        assert!(p.may_leave("leave_hospital"));
        assert!(!Patient::new("bb2").with_service("neo").may_leave("leave_hospital"));
    }

    #[test]
    fn test_treatment_default() {
        let p = Patient::new("bb1");
        assert_eq!(p.treatment_or("no_treatment"), "no_treatment");
        let p = p.with_treatment("oxygen");
        assert_eq!(p.treatment_or("no_treatment"), "oxygen");
    }
}
