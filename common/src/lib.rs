//! Defines common types, traits, and functionality useful throughout the
//! workspace
//!
//! The centerpiece is the resource registry (`crm::Crm`), the set of cluster
//! resources a principal service asks the hacluster subordinate to manage

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod crm;
pub mod error;
pub mod types;

pub use crm::Crm;
pub use error::CrmError;
