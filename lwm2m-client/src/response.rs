//! The response view an `Operation` exposes after `perform()` (spec §4.D).
//!
//! Owning the parsed tree (rather than a borrowed pointer into daemon-owned
//! memory, as the C API does) makes the "dangling after free" failure mode
//! from §9's design notes unrepresentable: every accessor here borrows from
//! `&self`, so it cannot outlive the `Response` — which in turn cannot
//! outlive the `Operation` that produced it.

use std::collections::BTreeMap;

use lwm2m_codec::tree::ObjectsTree;
use lwm2m_codec::value_codec::decode_scalar;
use lwm2m_types::{Error, Opaque, ObjectLink, Path, PathError, Result, ResourceKind, ResourceValue, SparseArray};

#[derive(Debug, Clone)]
struct PathEntry {
    value_text: Option<String>,
    error: PathError,
}

/// A read-only, per-path view over a performed operation's result tree.
#[derive(Debug, Clone, Default)]
pub struct Response {
    entries: BTreeMap<Path, PathEntry>,
}

impl Response {
    pub fn from_tree(tree: &ObjectsTree) -> Response {
        let mut entries = BTreeMap::new();
        for (path, value_text, result) in tree.walk() {
            // A bare `Result` node carries the per-path outcome; its absence
            // with a present `Value` means success (the daemon only emits
            // `Result` for non-success paths, per spec §6's grammar).
            let error = match result {
                Some(r) => r.error,
                None if value_text.is_some() => PathError::Success,
                None => PathError::PathNotFound,
            };
            entries.insert(path, PathEntry { value_text, error });
        }
        Response { entries }
    }

    /// Iterates every path present in the response, in path order.
    pub fn paths(&self) -> impl Iterator<Item = Path> + '_ {
        self.entries.keys().copied()
    }

    pub fn get_path_result(&self, path: Path) -> PathError {
        self.entries.get(&path).map(|e| e.error).unwrap_or(PathError::PathNotFound)
    }

    fn require_value(&self, path: Path) -> Result<&str> {
        let entry = self.entries.get(&path).ok_or(Error::PathNotFound)?;
        if !entry.error.is_success() {
            return Err(match entry.error {
                PathError::LWM2MError(lw) => Error::LWM2MError(lw),
                PathError::NotDefined => Error::NotDefined,
                PathError::TypeMismatch => Error::TypeMismatch,
                PathError::Timeout => Error::Timeout,
                PathError::PathNotFound => Error::PathNotFound,
                PathError::Internal | PathError::Success => Error::Internal("inconsistent path result".into()),
            });
        }
        entry.value_text.as_deref().ok_or(Error::PathNotFound)
    }

    /// Decodes a single scalar value against its expected kind.
    pub fn get_value(&self, path: Path, kind: ResourceKind) -> Result<ResourceValue> {
        let text = self.require_value(path)?;
        decode_scalar(kind, text)
    }

    pub fn get_string(&self, path: Path) -> Result<String> {
        self.require_value(path).map(|s| s.to_string())
    }

    pub fn get_integer(&self, path: Path) -> Result<i64> {
        self.require_value(path)?.parse().map_err(|_| Error::TypeMismatch)
    }

    pub fn get_float(&self, path: Path) -> Result<f64> {
        self.require_value(path)?.parse().map_err(|_| Error::TypeMismatch)
    }

    pub fn get_boolean(&self, path: Path) -> Result<bool> {
        match self.require_value(path)? {
            "True" => Ok(true),
            "False" => Ok(false),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn get_opaque(&self, path: Path) -> Result<Opaque> {
        match decode_scalar(ResourceKind::Opaque, self.require_value(path)?)? {
            ResourceValue::Opaque(o) => Ok(o),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Copies the opaque payload into a caller-provided buffer, returning
    /// the number of bytes written (spec §4.D "may also copy into a
    /// caller-provided buffer").
    pub fn copy_opaque_into(&self, path: Path, buf: &mut [u8]) -> Result<usize> {
        let opaque = self.get_opaque(path)?;
        if opaque.len() > buf.len() {
            return Err(Error::Overrun);
        }
        buf[..opaque.len()].copy_from_slice(&opaque.0);
        Ok(opaque.len())
    }

    pub fn get_time(&self, path: Path) -> Result<i64> {
        self.get_integer(path)
    }

    pub fn get_object_link(&self, path: Path) -> Result<ObjectLink> {
        self.require_value(path)?.parse()
    }

    /// Collects every resource-instance child of a resource path into a
    /// sparse array, decoding each against `kind` (the scalar kind, not the
    /// array kind — array membership is structural, not a value tag).
    pub fn get_array(&self, resource_path: Path, kind: ResourceKind) -> Result<SparseArray<ResourceValue>> {
        if !resource_path.is_resource() {
            return Err(Error::PathInvalid("array accessor requires a resource path".into()));
        }
        let mut out = SparseArray::new();
        for (path, entry) in &self.entries {
            if path.is_resource_instance() && path.parent() == Some(resource_path) && entry.error.is_success() {
                if let Some(text) = &entry.value_text {
                    let value = decode_scalar(kind, text)?;
                    out.insert(path.resource_instance.unwrap().value(), value);
                }
            }
        }
        if out.is_empty() && self.get_path_result(resource_path) != PathError::Success {
            return Err(Error::PathNotFound);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lwm2m_codec::tree::{ObjectsTree, TreeLeaf};
    use lwm2m_types::{InstanceId, ObjectId, ResourceId, ResourceInstanceId};

    #[test]
    fn scalar_round_trips_through_response() {
        let leaves = vec![TreeLeaf {
            path: Path::resource(ObjectId(3), InstanceId(0), ResourceId(0)),
            value: Some(ResourceValue::String("Acme".into())),
            subscribe: None,
        }];
        let tree = ObjectsTree::build(&leaves);
        let response = Response::from_tree(&tree);
        assert_eq!(
            response.get_string(Path::resource(ObjectId(3), InstanceId(0), ResourceId(0))).unwrap(),
            "Acme"
        );
    }

    #[test]
    fn missing_path_is_path_not_found() {
        let response = Response::default();
        let err = response.get_string(Path::resource(ObjectId(3), InstanceId(0), ResourceId(0))).unwrap_err();
        assert_eq!(err, Error::PathNotFound);
    }

    #[test]
    fn array_collects_only_present_instances() {
        let leaves = vec![
            TreeLeaf {
                path: Path::resource_instance(ObjectId(3), InstanceId(0), ResourceId(6), ResourceInstanceId(1)),
                value: Some(ResourceValue::Integer(10)),
                subscribe: None,
            },
            TreeLeaf {
                path: Path::resource_instance(ObjectId(3), InstanceId(0), ResourceId(6), ResourceInstanceId(3)),
                value: Some(ResourceValue::Integer(30)),
                subscribe: None,
            },
        ];
        let tree = ObjectsTree::build(&leaves);
        let response = Response::from_tree(&tree);
        let array = response
            .get_array(Path::resource(ObjectId(3), InstanceId(0), ResourceId(6)), ResourceKind::Integer)
            .unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.get(&1), Some(&ResourceValue::Integer(10)));
        assert_eq!(array.get(&3), Some(&ResourceValue::Integer(30)));
    }
}
