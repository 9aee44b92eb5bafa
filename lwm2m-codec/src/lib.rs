//! Path grammar, structured content tree, and `quick-xml` wire codec for
//! the LwM2M IPC channel (spec §4.B / §6).
//!
//! Internally a path is the structured `(ObjectId, Option<InstanceId>,
//! Option<ResourceId>, Option<ResourceInstanceId>)` key from `lwm2m-types`;
//! string paths are produced and parsed only at this crate's boundary
//! (`path_codec`), matching §9's design note that a structured key removes
//! the parse step on every hash lookup.

pub mod path_codec;
pub mod tree;
pub mod value_codec;
pub mod wire;

pub use path_codec::{ids_to_path, parse_path, path_to_ids, PathIds};
pub use tree::{
    ClientNode, ClientsTree, ContentTree, ObjectInstanceNode, ObjectNode, ObjectsTree,
    ResourceInstanceNode, ResourceNode, ResultNode, SubscribeTag, TreeLeaf,
};
pub use wire::{Message, MessageType, ResponseCode, SubType};
