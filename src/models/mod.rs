//! Allocation domain models.
//!
//! Provides the entities (services, patients, beds) and the canonical
//! binary relations linking them.
//!
//! # Domain Mappings
//!
//! | u-bedalloc | Neonatal unit | Generic |
//! |------------|---------------|---------|
//! | Patient | Baby | Demand unit |
//! | Resource | Bed / Room | Placement slot |
//! | Service | Care category | Compatibility class |
//! | out | Discharge | Unbounded sink |

mod dataset;
mod patient;
mod relation;
mod resource;
mod service;

pub use dataset::{Dataset, Relations};
pub use patient::Patient;
pub use relation::{split_list, Relation};
pub use resource::Resource;
pub use service::ServiceCatalog;
