//! Resource storage bindings (spec §4.F).
//!
//! `original_source/api/include/awa/static.h` exposes three ways to bind a
//! resource: `RegisterResourceWithPointer` (one contiguous buffer, one
//! element per object instance at a fixed stride), `RegisterResourceWithPointerArray`
//! (one pointer per object instance, no fixed stride) and
//! `RegisterResourceWithHandler` (callback owns the data entirely — see
//! `handler.rs`). The pointer variants model memory the *application* owns;
//! this crate only ever reads/writes through the raw pointer at the
//! offsets the binding describes, matching the C API's contract that the
//! pointer stays valid for as long as the resource is registered.

use lwm2m_types::{Error, ObjectLink, Opaque, Result, ResourceKind, ResourceValue};

/// A single contiguous buffer holding one fixed-width element per object
/// instance: instance `k`'s bytes live at `ptr + k * step_size`, width
/// `element_size` (spec §4.F).
///
/// # Safety
/// The caller guarantees `ptr` is valid for reads/writes of
/// `step_size * (max_instances)` bytes for as long as the binding is
/// registered, and that no other code mutates that memory while
/// [`crate::StaticClient::process`] is running (spec §5 "the application
/// must not mutate storage-bound resources while `process()` is
/// executing").
pub struct PointerBinding {
    ptr: *mut u8,
    element_size: usize,
    step_size: usize,
}

impl PointerBinding {
    pub fn new(ptr: *mut u8, element_size: usize, step_size: usize) -> Result<Self> {
        if ptr.is_null() || element_size == 0 {
            return Err(Error::DefinitionInvalid("storage pointer must be non-null with element_size >= 1".into()));
        }
        Ok(Self { ptr, element_size, step_size })
    }

    fn instance_ptr(&self, instance_index: u16) -> *mut u8 {
        // SAFETY: caller-established invariant on `ptr`'s extent (see struct doc).
        unsafe { self.ptr.add(instance_index as usize * self.step_size) }
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn read(&self, instance_index: u16) -> Vec<u8> {
        let p = self.instance_ptr(instance_index);
        // SAFETY: see struct doc; `element_size` bytes are always in bounds.
        unsafe { std::slice::from_raw_parts(p, self.element_size).to_vec() }
    }

    pub fn write(&self, instance_index: u16, bytes: &[u8]) {
        let p = self.instance_ptr(instance_index);
        let n = bytes.len().min(self.element_size);
        // SAFETY: see struct doc; writing at most `element_size` bytes stays in bounds.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), p, n) };
    }

    pub fn raw_ptr(&self, instance_index: u16) -> *mut u8 {
        self.instance_ptr(instance_index)
    }
}

/// One pointer per object instance, each `element_size` bytes wide, with no
/// assumed relationship between consecutive instances' addresses (spec
/// §4.F "Storage pointer array").
pub struct PointerArrayBinding {
    ptrs: Vec<*mut u8>,
    element_size: usize,
}

impl PointerArrayBinding {
    pub fn new(ptrs: Vec<*mut u8>, element_size: usize) -> Result<Self> {
        if ptrs.is_empty() || element_size == 0 || ptrs.iter().any(|p| p.is_null()) {
            return Err(Error::DefinitionInvalid(
                "pointer array must be non-empty, non-null, with element_size >= 1".into(),
            ));
        }
        Ok(Self { ptrs, element_size })
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn read(&self, instance_index: u16) -> Result<Vec<u8>> {
        let p = *self.ptrs.get(instance_index as usize).ok_or(Error::NotDefined)?;
        // SAFETY: see `PointerBinding`'s doc; applies identically per-pointer here.
        Ok(unsafe { std::slice::from_raw_parts(p, self.element_size).to_vec() })
    }

    pub fn write(&self, instance_index: u16, bytes: &[u8]) -> Result<()> {
        let p = *self.ptrs.get(instance_index as usize).ok_or(Error::NotDefined)?;
        let n = bytes.len().min(self.element_size);
        // SAFETY: see `PointerBinding`'s doc.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), p, n) };
        Ok(())
    }

    pub fn raw_ptr(&self, instance_index: u16) -> Result<*mut u8> {
        self.ptrs.get(instance_index as usize).copied().ok_or(Error::NotDefined)
    }
}

/// How a resource's value is physically stored; the third option
/// (`Handler`) lives in `handler.rs` since it carries a boxed trait object
/// rather than raw memory.
pub enum ResourceStorage {
    Pointer(PointerBinding),
    PointerArray(PointerArrayBinding),
    Handler(Box<dyn crate::handler::ResourceHandler>),
}

/// Encodes a scalar value into its native in-memory representation — the
/// byte layout a C `int64_t`/`double`/`bool` would have, since storage
/// pointer bindings point at application-owned C-shaped memory (spec §4.F,
/// `original_source`'s `void *dataPointer`). Little-endian throughout;
/// this library does not run on big-endian targets in practice and the
/// original C code used the platform's native layout directly.
pub fn encode_native(value: &ResourceValue) -> Vec<u8> {
    match value {
        ResourceValue::None => Vec::new(),
        ResourceValue::Integer(v) | ResourceValue::Time(v) => v.to_le_bytes().to_vec(),
        ResourceValue::Float(v) => v.to_le_bytes().to_vec(),
        ResourceValue::Boolean(v) => vec![*v as u8],
        ResourceValue::Opaque(Opaque(bytes)) => bytes.clone(),
        ResourceValue::String(s) => s.as_bytes().to_vec(),
        ResourceValue::ObjectLink(link) => {
            let mut out = Vec::with_capacity(4);
            out.extend_from_slice(&link.object_id.to_le_bytes());
            out.extend_from_slice(&link.instance_id.to_le_bytes());
            out
        }
        _ => Vec::new(), // array kinds are written per-instance, never as one blob
    }
}

/// The inverse of [`encode_native`], decoding raw storage bytes back into a
/// typed value against the resource's defined kind.
pub fn decode_native(kind: ResourceKind, bytes: &[u8]) -> Result<ResourceValue> {
    Ok(match kind {
        ResourceKind::None => ResourceValue::None,
        ResourceKind::Integer => ResourceValue::Integer(i64::from_le_bytes(
            bytes.get(0..8).and_then(|b| b.try_into().ok()).ok_or(Error::TypeMismatch)?,
        )),
        ResourceKind::Time => ResourceValue::Time(i64::from_le_bytes(
            bytes.get(0..8).and_then(|b| b.try_into().ok()).ok_or(Error::TypeMismatch)?,
        )),
        ResourceKind::Float => ResourceValue::Float(f64::from_le_bytes(
            bytes.get(0..8).and_then(|b| b.try_into().ok()).ok_or(Error::TypeMismatch)?,
        )),
        ResourceKind::Boolean => ResourceValue::Boolean(*bytes.first().ok_or(Error::TypeMismatch)? != 0),
        ResourceKind::Opaque => ResourceValue::Opaque(Opaque(bytes.to_vec())),
        ResourceKind::String => ResourceValue::String(
            String::from_utf8(bytes.split(|b| *b == 0).next().unwrap_or(bytes).to_vec())
                .map_err(|_| Error::TypeMismatch)?,
        ),
        ResourceKind::ObjectLink => {
            let object_id = u16::from_le_bytes(bytes.get(0..2).and_then(|b| b.try_into().ok()).ok_or(Error::TypeMismatch)?);
            let instance_id = u16::from_le_bytes(bytes.get(2..4).and_then(|b| b.try_into().ok()).ok_or(Error::TypeMismatch)?);
            ResourceValue::ObjectLink(ObjectLink { object_id, instance_id })
        }
        _ => return Err(Error::TypeMismatch), // array kinds decoded per-instance by the caller
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_binding_reads_back_what_it_writes() {
        let mut backing = [0u8; 16];
        let binding = PointerBinding::new(backing.as_mut_ptr(), 8, 8).unwrap();
        binding.write(1, &42i64.to_le_bytes());
        assert_eq!(decode_native(ResourceKind::Integer, &binding.read(1)).unwrap(), ResourceValue::Integer(42));
    }

    #[test]
    fn pointer_array_out_of_range_instance_is_not_defined() {
        let mut a = 0i64;
        let binding = PointerArrayBinding::new(vec![&mut a as *mut i64 as *mut u8], 8).unwrap();
        assert_eq!(binding.read(1).unwrap_err(), Error::NotDefined);
    }

    #[test]
    fn null_pointer_is_rejected_at_construction() {
        assert!(PointerBinding::new(std::ptr::null_mut(), 8, 8).is_err());
    }

    #[test]
    fn float_round_trips_native_encoding() {
        let value = ResourceValue::Float(3.5);
        let bytes = encode_native(&value);
        assert_eq!(decode_native(ResourceKind::Float, &bytes).unwrap(), value);
    }

    #[test]
    fn object_link_round_trips_native_encoding() {
        let value = ResourceValue::ObjectLink(ObjectLink { object_id: 3, instance_id: 7 });
        let bytes = encode_native(&value);
        assert_eq!(decode_native(ResourceKind::ObjectLink, &bytes).unwrap(), value);
    }
}
