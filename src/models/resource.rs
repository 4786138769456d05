//! Bed (resource) model.
//!
//! Beds are the placement units. A bed may exist before the
//! reconfiguration (old), after it (new), or both. Only new beds receive
//! patients; old-only beds must be vacated.
//!
//! The discharge pseudo-resource ("out") is not a [`Resource`]: it is added
//! by [`Dataset`](super::Dataset) with unlimited capacity.

use serde::{Deserialize, Serialize};

/// A bed or room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique bed identifier.
    pub id: String,
    /// Available after the reconfiguration.
    pub is_new: bool,
    /// Existed before the reconfiguration.
    pub is_old: bool,
    /// Marked as leaving the unit.
    pub going_out: bool,
    /// Services this bed can deliver.
    pub services: Vec<String>,
    /// Number of patients it can hold. `None` when not declared.
    pub capacity: Option<u32>,
    /// Whether moves onto this bed are weighted by service rank.
    pub priority: bool,
    /// Specific treatments supported. The "no treatment" sentinel is
    /// always implicitly supported.
    pub treatments: Vec<String>,
}

impl Resource {
    /// Creates a bed with no flags, services or capacity.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_new: false,
            is_old: false,
            going_out: false,
            services: Vec::new(),
            capacity: None,
            priority: false,
            treatments: Vec::new(),
        }
    }

    /// Creates a bed present both before and after, with capacity 1.
    pub fn kept(id: impl Into<String>) -> Self {
        Self::new(id).old().new_place().with_capacity(1)
    }

    /// Marks the bed as existing before the reconfiguration.
    pub fn old(mut self) -> Self {
        self.is_old = true;
        self
    }

    /// Marks the bed as available after the reconfiguration.
    pub fn new_place(mut self) -> Self {
        self.is_new = true;
        self
    }

    /// Marks the bed as leaving the unit.
    pub fn leaving(mut self) -> Self {
        self.going_out = true;
        self
    }

    /// Adds an offered service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        let service = service.into();
        if !self.services.contains(&service) {
            self.services.push(service);
        }
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the priority flag.
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a supported treatment.
    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        let treatment = treatment.into();
        if !self.treatments.contains(&treatment) {
            self.treatments.push(treatment);
        }
        self
    }

    /// Capacity used by the capacity constraint and sums (undeclared = 0).
    pub fn effective_capacity(&self) -> u32 {
        self.capacity.unwrap_or(0)
    }

    /// Exponent applied to the service rank in the objective (0 or 1).
    pub fn priority_exponent(&self) -> u32 {
        u32::from(self.priority)
    }

    /// Whether the bed survives the reconfiguration.
    pub fn is_kept(&self) -> bool {
        self.is_old && self.is_new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let r = Resource::new("r1")
            .old()
            .new_place()
            .with_service("neo")
            .with_service("rea")
            .with_capacity(2)
            .with_priority(true)
            .with_treatment("oxygen");

        assert_eq!(r.id, "r1");
        assert!(r.is_kept());
        assert_eq!(r.services, vec!["neo", "rea"]);
        assert_eq!(r.effective_capacity(), 2);
        assert_eq!(r.priority_exponent(), 1);
        assert_eq!(r.treatments, vec!["oxygen"]);
    }

    #[test]
    fn test_defaults() {
        let r = Resource::new("r9");
        assert!(!r.is_new && !r.is_old && !r.going_out);
        assert_eq!(r.capacity, None);
        assert_eq!(r.effective_capacity(), 0);
        assert_eq!(r.priority_exponent(), 0);
    }

    #[test]
    fn test_kept_shortcut() {
        let r = Resource::kept("r2").leaving();
        assert!(r.is_kept());
        assert!(r.going_out);
        assert_eq!(r.capacity, Some(1));
    }
}
