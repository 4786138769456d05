//! Run configuration.
//!
//! Sentinel names and parsing conventions shared by the loader, the
//! validation engine and the formulator. Defaults match the layout of the
//! neonatal unit workbooks (`leave_hospital`, `no_treatment`, `out`).

use serde::{Deserialize, Serialize};

/// Configuration for one allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Separator used in multi-valued cells (e.g. `"neo,intensive"`).
    pub delimiter: char,
    /// Service meaning "the patient may leave the unit".
    pub discharge_service: String,
    /// Treatment meaning "no treatment required / offered".
    pub no_treatment: String,
    /// Identifier of the discharge pseudo-resource.
    pub out_place: String,
    /// Cell value marking a boolean flag as set.
    pub yes_flag: String,
    /// Proceed past mapping and coherence failures (warnings are still emitted).
    pub force: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            discharge_service: "leave_hospital".to_string(),
            no_treatment: "no_treatment".to_string(),
            out_place: "out".to_string(),
            yes_flag: "yes".to_string(),
            force: false,
        }
    }
}

impl AllocationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the force override.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets the multi-value delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the discharge service name.
    pub fn with_discharge_service(mut self, name: impl Into<String>) -> Self {
        self.discharge_service = name.into();
        self
    }

    /// Sets the "no treatment" sentinel.
    pub fn with_no_treatment(mut self, name: impl Into<String>) -> Self {
        self.no_treatment = name.into();
        self
    }

    /// Sets the discharge pseudo-resource identifier.
    pub fn with_out_place(mut self, name: impl Into<String>) -> Self {
        self.out_place = name.into();
        self
    }

    /// Whether a raw flag cell is set.
    pub fn is_yes(&self, cell: Option<&str>) -> bool {
        cell.is_some_and(|v| v.trim().eq_ignore_ascii_case(&self.yes_flag))
    }
}
