//! Resource kinds and the typed value sum-type.
//!
//! The source branches on a `ResourceType` enum tag at every accessor, the
//! pattern §9's design notes call out for replacement by "a sum/tagged-union
//! over the eight scalar kinds plus a per-kind array type". [`ResourceValue`]
//! is that sum type; [`ResourceKind`] is its tag, kept as a separate enum
//! because definitions need to talk about a kind before any value exists.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResourceKind {
    None,
    String,
    Integer,
    Float,
    Boolean,
    Opaque,
    Time,
    ObjectLink,
    StringArray,
    IntegerArray,
    FloatArray,
    BooleanArray,
    OpaqueArray,
    TimeArray,
    ObjectLinkArray,
}

impl ResourceKind {
    /// `true` for the eight `*Array` kinds.
    pub fn is_array(self) -> bool {
        matches!(
            self,
            ResourceKind::StringArray
                | ResourceKind::IntegerArray
                | ResourceKind::FloatArray
                | ResourceKind::BooleanArray
                | ResourceKind::OpaqueArray
                | ResourceKind::TimeArray
                | ResourceKind::ObjectLinkArray
        )
    }

    /// The executable placeholder kind. Execute access is only valid on it.
    pub fn is_executable_kind(self) -> bool {
        matches!(self, ResourceKind::None)
    }

    /// The array kind corresponding to a scalar kind, if any (`None` has no
    /// array form — it is the executable placeholder).
    pub fn array_kind(self) -> Option<ResourceKind> {
        use ResourceKind::*;
        Some(match self {
            String => StringArray,
            Integer => IntegerArray,
            Float => FloatArray,
            Boolean => BooleanArray,
            Opaque => OpaqueArray,
            Time => TimeArray,
            ObjectLink => ObjectLinkArray,
            _ => return None,
        })
    }

    /// The scalar kind corresponding to an array kind, if any.
    pub fn scalar_kind(self) -> Option<ResourceKind> {
        use ResourceKind::*;
        Some(match self {
            StringArray => String,
            IntegerArray => Integer,
            FloatArray => Float,
            BooleanArray => Boolean,
            OpaqueArray => Opaque,
            TimeArray => Time,
            ObjectLinkArray => ObjectLink,
            _ => return None,
        })
    }
}

/// An object ID + object-instance ID pair, the target of an `ObjectLink`
/// resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ObjectLink {
    pub object_id: u16,
    pub instance_id: u16,
}

impl fmt::Display for ObjectLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_id, self.instance_id)
    }
}

impl std::str::FromStr for ObjectLink {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (o, i) = s
            .split_once(':')
            .ok_or_else(|| crate::error::Error::TypeMismatch)?;
        let object_id = o.parse().map_err(|_| crate::error::Error::TypeMismatch)?;
        let instance_id = i.parse().map_err(|_| crate::error::Error::TypeMismatch)?;
        Ok(ObjectLink { object_id, instance_id })
    }
}

/// An opaque byte payload. `size = 0` with non-empty backing storage is a
/// legitimate empty payload, distinct from "no value at all".
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Opaque(pub Vec<u8>);

impl Opaque {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A sparse array of resource-instance values. Absent indices are simply
/// not present in the map; a sparse write never synthesises neighbouring
/// entries (§3 "array writes are sparse update semantics").
pub type SparseArray<T> = BTreeMap<u16, T>;

/// The typed value carried by a single resource or resource instance.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ResourceValue {
    /// The executable placeholder kind never carries a value.
    None,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Opaque(Opaque),
    Time(i64),
    ObjectLink(ObjectLink),
    StringArray(SparseArray<String>),
    IntegerArray(SparseArray<i64>),
    FloatArray(SparseArray<f64>),
    BooleanArray(SparseArray<bool>),
    OpaqueArray(SparseArray<Opaque>),
    TimeArray(SparseArray<i64>),
    ObjectLinkArray(SparseArray<ObjectLink>),
}

impl ResourceValue {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceValue::None => ResourceKind::None,
            ResourceValue::String(_) => ResourceKind::String,
            ResourceValue::Integer(_) => ResourceKind::Integer,
            ResourceValue::Float(_) => ResourceKind::Float,
            ResourceValue::Boolean(_) => ResourceKind::Boolean,
            ResourceValue::Opaque(_) => ResourceKind::Opaque,
            ResourceValue::Time(_) => ResourceKind::Time,
            ResourceValue::ObjectLink(_) => ResourceKind::ObjectLink,
            ResourceValue::StringArray(_) => ResourceKind::StringArray,
            ResourceValue::IntegerArray(_) => ResourceKind::IntegerArray,
            ResourceValue::FloatArray(_) => ResourceKind::FloatArray,
            ResourceValue::BooleanArray(_) => ResourceKind::BooleanArray,
            ResourceValue::OpaqueArray(_) => ResourceKind::OpaqueArray,
            ResourceValue::TimeArray(_) => ResourceKind::TimeArray,
            ResourceValue::ObjectLinkArray(_) => ResourceKind::ObjectLinkArray,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ResourceValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ResourceValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ResourceValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ResourceValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            ResourceValue::Opaque(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<i64> {
        match self {
            ResourceValue::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object_link(&self) -> Option<ObjectLink> {
        match self {
            ResourceValue::ObjectLink(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_scalar_kind_round_trip() {
        assert_eq!(ResourceKind::Integer.array_kind(), Some(ResourceKind::IntegerArray));
        assert_eq!(ResourceKind::IntegerArray.scalar_kind(), Some(ResourceKind::Integer));
        assert_eq!(ResourceKind::None.array_kind(), None);
    }

    #[test]
    fn object_link_display_and_parse() {
        let link = ObjectLink { object_id: 3, instance_id: 7 };
        assert_eq!(link.to_string(), "3:7");
        let parsed: ObjectLink = "3:7".parse().unwrap();
        assert_eq!(parsed, link);
    }

    #[test]
    fn sparse_array_keeps_only_written_indices() {
        let mut arr: SparseArray<i64> = SparseArray::new();
        arr.insert(1, 10);
        arr.insert(3, 30);
        let indices: Vec<u16> = arr.keys().copied().collect();
        assert_eq!(indices, vec![1, 3]);
    }
}
