//! The payload handed to a subscription callback (spec §4.E).

use lwm2m_codec::value_codec::decode_scalar;
use lwm2m_types::{Opaque, Path, ResourceKind, ResourceValue, Result};

/// The single path/value pair a change notification carries. Unlike
/// [`crate::response::Response`] this is not a multi-path tree view — one
/// `ChangeSet` corresponds to one notified path.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    path: Path,
    value_text: Option<String>,
}

impl ChangeSet {
    pub(crate) fn new(path: Path, value_text: Option<String>) -> Self {
        Self { path, value_text }
    }

    pub fn path(&self) -> Path {
        self.path
    }

    fn text(&self) -> Result<&str> {
        self.value_text.as_deref().ok_or(lwm2m_types::Error::PathNotFound)
    }

    pub fn get_value(&self, kind: ResourceKind) -> Result<ResourceValue> {
        decode_scalar(kind, self.text()?)
    }

    pub fn get_string(&self) -> Result<String> {
        Ok(self.text()?.to_string())
    }

    pub fn get_integer(&self) -> Result<i64> {
        self.text()?.parse().map_err(|_| lwm2m_types::Error::TypeMismatch)
    }

    pub fn get_float(&self) -> Result<f64> {
        self.text()?.parse().map_err(|_| lwm2m_types::Error::TypeMismatch)
    }

    pub fn get_boolean(&self) -> Result<bool> {
        match self.text()? {
            "True" => Ok(true),
            "False" => Ok(false),
            _ => Err(lwm2m_types::Error::TypeMismatch),
        }
    }
}

/// The argument payload delivered to an execute-subscription callback
/// (spec §4.E "Execute subscriptions receive the argument bytes, if any,
/// that accompanied the triggering Execute").
#[derive(Debug, Clone, Default)]
pub struct ExecuteArguments {
    data: Option<Vec<u8>>,
}

impl ExecuteArguments {
    pub(crate) fn new(data: Option<Vec<u8>>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn as_opaque(&self) -> Option<Opaque> {
        self.data.clone().map(Opaque)
    }
}
