//! The structured content tree (spec §4.B/§6): `Objects`/`Object`/
//! `ObjectInstance`/`Resource`/`ResourceInstance` nodes, each carrying an
//! `ID` plus optional `Value`/`Result`/subscribe tag — and the server-side
//! `Clients`/`Client` variant used by the List Clients operation.
//!
//! This is a concrete enum tree, not a generic XML DOM: one struct per node
//! name in the grammar, matching `adamtc007-ob-poc/bpmn-lite-core`'s use of
//! `quick-xml` to (de)serialise its own tree-shaped wire format rather than
//! walking a generic document model.

use lwm2m_types::{InstanceId, ObjectId, Path, PathError, ResourceId, ResourceInstanceId, ResourceValue};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeTag {
    SubscribeToChange,
    CancelSubscribeToChange,
    SubscribeToExecute,
    CancelSubscribeToExecute,
    Observe,
    CancelObserve,
}

impl SubscribeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscribeTag::SubscribeToChange => "SubscribeToChange",
            SubscribeTag::CancelSubscribeToChange => "CancelSubscribeToChange",
            SubscribeTag::SubscribeToExecute => "SubscribeToExecute",
            SubscribeTag::CancelSubscribeToExecute => "CancelSubscribeToExecute",
            SubscribeTag::Observe => "Observe",
            SubscribeTag::CancelObserve => "CancelObserve",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "SubscribeToChange" => SubscribeTag::SubscribeToChange,
            "CancelSubscribeToChange" => SubscribeTag::CancelSubscribeToChange,
            "SubscribeToExecute" => SubscribeTag::SubscribeToExecute,
            "CancelSubscribeToExecute" => SubscribeTag::CancelSubscribeToExecute,
            "Observe" => SubscribeTag::Observe,
            "CancelObserve" => SubscribeTag::CancelObserve,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultNode {
    pub error: PathError,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceInstanceNode {
    pub id: u16,
    pub value: Option<String>,
    pub result: Option<ResultNode>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceNode {
    pub id: u16,
    pub value: Option<String>,
    pub instances: Vec<ResourceInstanceNode>,
    pub subscribe: Option<SubscribeTag>,
    pub result: Option<ResultNode>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectInstanceNode {
    pub id: u16,
    pub resources: Vec<ResourceNode>,
    pub result: Option<ResultNode>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    pub id: u16,
    pub instances: Vec<ObjectInstanceNode>,
    pub result: Option<ResultNode>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectsTree {
    pub objects: Vec<ObjectNode>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientNode {
    pub id: u16,
    pub objects: Option<ObjectsTree>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientsTree {
    pub clients: Vec<ClientNode>,
}

#[derive(Debug, Clone)]
pub enum ContentTree {
    Objects(ObjectsTree),
    Clients(ClientsTree),
}

/// One leaf to be encoded: the path, its value (absent for a pure
/// subscribe/cancel entry or a bare existence probe), and an optional
/// subscribe tag.
#[derive(Debug, Clone)]
pub struct TreeLeaf {
    pub path: Path,
    pub value: Option<ResourceValue>,
    pub subscribe: Option<SubscribeTag>,
}

impl ObjectsTree {
    /// Builds a minimal tree from an unordered set of leaves: no duplicate
    /// object/instance/resource subtrees are created for paths that share a
    /// prefix (§4.B "Accept an unordered set of input paths and produce a
    /// minimal tree that represents them").
    pub fn build(leaves: &[TreeLeaf]) -> ObjectsTree {
        let mut objects: BTreeMap<ObjectId, ObjectNodeBuilder> = BTreeMap::new();

        for leaf in leaves {
            let object = objects.entry(leaf.path.object).or_default();
            match (leaf.path.instance, leaf.path.resource, leaf.path.resource_instance) {
                (None, _, _) => {}
                (Some(instance), None, _) => {
                    object.instances.entry(instance).or_default();
                }
                (Some(instance), Some(resource), None) => {
                    let inst = object.instances.entry(instance).or_default();
                    let res = inst.resources.entry(resource).or_default();
                    if let Some(value) = &leaf.value {
                        res.value = crate::value_codec::encode_scalar(value);
                    }
                    res.subscribe = leaf.subscribe;
                }
                (Some(instance), Some(resource), Some(ri)) => {
                    let inst = object.instances.entry(instance).or_default();
                    let res = inst.resources.entry(resource).or_default();
                    let value = leaf.value.as_ref().and_then(crate::value_codec::encode_scalar);
                    res.instances.push(ResourceInstanceNode {
                        id: ri.value(),
                        value,
                        result: None,
                    });
                }
            }
        }

        ObjectsTree {
            objects: objects
                .into_iter()
                .map(|(id, builder)| builder.into_node(id.value()))
                .collect(),
        }
    }

    /// Walks every leaf present in the tree, pairing its path with the
    /// per-path result and raw text value (decoding against a definition is
    /// the caller's job — this layer only knows the wire text).
    pub fn walk(&self) -> Vec<(Path, Option<String>, Option<ResultNode>)> {
        let mut out = Vec::new();
        for object in &self.objects {
            let object_id = ObjectId(object.id);
            if object.instances.is_empty() {
                out.push((Path::object(object_id), None, object.result));
                continue;
            }
            for instance in &object.instances {
                let instance_id = InstanceId(instance.id);
                if instance.resources.is_empty() {
                    out.push((Path::instance(object_id, instance_id), None, instance.result));
                    continue;
                }
                for resource in &instance.resources {
                    let resource_id = ResourceId(resource.id);
                    if resource.instances.is_empty() {
                        out.push((
                            Path::resource(object_id, instance_id, resource_id),
                            resource.value.clone(),
                            resource.result,
                        ));
                    } else {
                        for ri in &resource.instances {
                            out.push((
                                Path::resource_instance(object_id, instance_id, resource_id, ResourceInstanceId(ri.id)),
                                ri.value.clone(),
                                ri.result,
                            ));
                        }
                    }
                }
            }
        }
        out
    }
}

#[derive(Default)]
struct ObjectNodeBuilder {
    instances: BTreeMap<InstanceId, ObjectInstanceNodeBuilder>,
}

#[derive(Default)]
struct ObjectInstanceNodeBuilder {
    resources: BTreeMap<ResourceId, ResourceNode>,
}

impl ObjectNodeBuilder {
    fn into_node(self, id: u16) -> ObjectNode {
        ObjectNode {
            id,
            instances: self
                .instances
                .into_iter()
                .map(|(iid, builder)| builder.into_node(iid.value()))
                .collect(),
            result: None,
        }
    }
}

impl ObjectInstanceNodeBuilder {
    fn into_node(self, id: u16) -> ObjectInstanceNode {
        ObjectInstanceNode {
            id,
            resources: self.resources.into_values().collect(),
            result: None,
        }
    }
}
