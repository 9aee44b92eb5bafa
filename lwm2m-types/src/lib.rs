//! Identifiers, paths, resource kinds/values, and object/resource
//! definitions for the LwM2M data-model engine.
//!
//! This crate depends on nothing beyond `serde` (for downstream wire
//! interop) and `thiserror`/`dashmap` — every other crate in the workspace
//! builds on top of it.

pub mod definition;
pub mod error;
pub mod id;
pub mod path;
pub mod registry;
pub mod value;

pub use definition::{AccessMode, ObjectDefinition, ResourceDefinition};
pub use error::{Error, LwM2MError, PathError, Result};
pub use id::{InstanceId, ObjectId, ResourceId, ResourceInstanceId, INVALID_ID, MAX_ID};
pub use path::Path;
pub use registry::Registry;
pub use value::{ObjectLink, Opaque, ResourceKind, ResourceValue, SparseArray};
