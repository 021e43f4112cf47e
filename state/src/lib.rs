//! Unit-local persistent state
//!
//! Every hook invocation is a fresh process, so anything that must outlive a
//! single relation event lives in a key-value store on the unit's disk. This
//! crate defines that store and the change-detection gate built on top of it

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod changes;
pub mod error;
pub mod kv;

pub use changes::ChangeGate;
pub use error::KvError;
pub use kv::{FileKv, MemoryKv, UnitKv};
