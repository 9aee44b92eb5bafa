//! The static client engine itself (spec §4.F), grounded on
//! `original_source/api/include/awa/static.h`'s `AwaStaticClient` API and on
//! the teacher's `ServiceModule::tick()` cadence concept, inverted from a
//! push-scheduled async tick to a pull-based "`process()` returns ms until
//! it should be called again" (§9 design note).
//!
//! Unlike [`lwm2m_client::session::Session`], which shares state across
//! threads via `DashMap`/`parking_lot`, [`StaticClient`] wraps its state in
//! a plain [`RefCell`]. Section 5 of the data model specifies that a static
//! client instance is accessed from exactly one thread; `RefCell`'s `!Sync`
//! bound turns that into a compile error rather than a runtime race if
//! violated, instead of reaching for `Mutex` machinery this crate has no
//! use for.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use lwm2m_types::{
    AccessMode, Error, InstanceId, ObjectId, Opaque, Path, Registry, Result, ResourceId,
    ResourceKind, ResourceValue,
};

use crate::config::FactoryBootstrapInfo;
use crate::handler::{HandlerOperation, HandlerRequest, HandlerResponse, LwM2MResult, ResourceHandler};
use crate::storage::{decode_native, encode_native, PointerArrayBinding, PointerBinding, ResourceStorage};
use crate::transport::{IncomingRequest, NullTransport, StaticTransport};

/// Fallback tick interval when the transport has no timer of its own to
/// report (no retransmission in flight, nothing scheduled) — one second,
/// matching the coarse polling cadence typical LWM2M client main loops use
/// between registration lifetime housekeeping.
const DEFAULT_TICK_MS: u64 = 1000;

struct ClientInner {
    registry: Registry,
    instances: HashMap<ObjectId, HashSet<InstanceId>>,
    present: HashSet<(ObjectId, InstanceId, ResourceId)>,
    storage: HashMap<(ObjectId, ResourceId), ResourceStorage>,
    changed: VecDeque<Path>,
    endpoint_name: Option<String>,
    listen_address: Option<String>,
    listen_port: Option<u16>,
    bootstrap_server_uri: Option<String>,
    bootstrap: Option<FactoryBootstrapInfo>,
    initialized: bool,
    transport: Box<dyn StaticTransport>,
}

impl ClientInner {
    fn new(transport: Box<dyn StaticTransport>) -> Self {
        Self {
            registry: Registry::new(),
            instances: HashMap::new(),
            present: HashSet::new(),
            storage: HashMap::new(),
            changed: VecDeque::new(),
            endpoint_name: None,
            listen_address: None,
            listen_port: None,
            bootstrap_server_uri: None,
            bootstrap: None,
            initialized: false,
            transport,
        }
    }
}

/// An in-process LWM2M client whose object/resource storage is bound
/// directly to application memory (spec §4.F).
pub struct StaticClient {
    inner: RefCell<ClientInner>,
}

impl Default for StaticClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticClient {
    pub fn new() -> Self {
        Self::with_transport(Box::new(NullTransport))
    }

    pub fn with_transport(transport: Box<dyn StaticTransport>) -> Self {
        Self { inner: RefCell::new(ClientInner::new(transport)) }
    }

    pub fn set_endpoint_name(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::DefinitionInvalid("endpoint name must not be empty".into()));
        }
        self.inner.borrow_mut().endpoint_name = Some(name);
        Ok(())
    }

    pub fn set_coap_listen_address_port(&self, address: impl Into<String>, port: u16) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.listen_address = Some(address.into());
        inner.listen_port = Some(port);
        Ok(())
    }

    pub fn set_bootstrap_server_uri(&self, uri: impl Into<String>) -> Result<()> {
        self.inner.borrow_mut().bootstrap_server_uri = Some(uri.into());
        Ok(())
    }

    pub fn set_factory_bootstrap_information(&self, info: FactoryBootstrapInfo) -> Result<()> {
        info.validate()?;
        self.inner.borrow_mut().bootstrap = Some(info);
        Ok(())
    }

    pub fn define_object(
        &self,
        object_id: ObjectId,
        name: impl Into<String>,
        min_instances: u16,
        max_instances: Option<u16>,
    ) -> Result<()> {
        self.inner.borrow().registry.define_object(object_id, name, min_instances, max_instances)
    }

    pub fn define_resource(
        &self,
        object_id: ObjectId,
        resource_id: ResourceId,
        name: impl Into<String>,
        kind: ResourceKind,
        min_instances: u16,
        max_instances: Option<u16>,
        access: AccessMode,
    ) -> Result<()> {
        self.inner
            .borrow()
            .registry
            .define_resource(object_id, resource_id, name, kind, min_instances, max_instances, access)
    }

    /// Binds a resource to `step_size`-strided storage in `ptr`, one
    /// `element_size`-wide element per object instance (instance `k` at
    /// `ptr + k * step_size`), mirroring
    /// `AwaStaticClient_RegisterResourceWithPointer`.
    ///
    /// # Safety
    /// `ptr` must stay valid and uniquely accessed by this client for as
    /// long as the binding is registered (see [`PointerBinding`]).
    pub fn set_resource_storage_with_pointer(
        &self,
        object_id: ObjectId,
        resource_id: ResourceId,
        ptr: *mut u8,
        element_size: usize,
        step_size: usize,
    ) -> Result<()> {
        let binding = PointerBinding::new(ptr, element_size, step_size)?;
        self.bind_storage(object_id, resource_id, ResourceStorage::Pointer(binding))
    }

    /// Binds a resource to one independent pointer per object instance,
    /// mirroring `AwaStaticClient_RegisterResourceWithPointerArray`.
    ///
    /// # Safety
    /// Every pointer in `ptrs` must stay valid and uniquely accessed by
    /// this client for as long as the binding is registered.
    pub fn set_resource_storage_with_pointer_array(
        &self,
        object_id: ObjectId,
        resource_id: ResourceId,
        ptrs: Vec<*mut u8>,
        element_size: usize,
    ) -> Result<()> {
        let binding = PointerArrayBinding::new(ptrs, element_size)?;
        self.bind_storage(object_id, resource_id, ResourceStorage::PointerArray(binding))
    }

    pub fn set_resource_operation_handler(
        &self,
        object_id: ObjectId,
        resource_id: ResourceId,
        handler: impl ResourceHandler + 'static,
    ) -> Result<()> {
        self.bind_storage(object_id, resource_id, ResourceStorage::Handler(Box::new(handler)))
    }

    fn bind_storage(&self, object_id: ObjectId, resource_id: ResourceId, storage: ResourceStorage) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.registry.get_resource_definition(object_id, resource_id).is_none() {
            return Err(Error::NotDefined);
        }
        if inner.storage.contains_key(&(object_id, resource_id)) {
            return Err(Error::AlreadyDefined);
        }
        inner.storage.insert((object_id, resource_id), storage);
        Ok(())
    }

    /// Finalises configuration; every `define_*`/`set_resource_storage_*`
    /// call after this point still works (definitions are additive), but
    /// `process()` refuses to run before it (spec §4.F "Init must precede
    /// Process").
    pub fn init(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.endpoint_name.is_none() {
            return Err(Error::StaticClientNotConfigured);
        }
        if inner.bootstrap.is_none() && inner.bootstrap_server_uri.is_none() {
            return Err(Error::StaticClientNotConfigured);
        }
        inner.initialized = true;
        Ok(())
    }

    pub fn create_object_instance(&self, object_id: ObjectId, instance_id: InstanceId) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let def = inner.registry.get_object_definition(object_id).ok_or(Error::NotDefined)?;
            let max_instances = def.max_instances;
            drop(def);
            let set = inner.instances.entry(object_id).or_default();
            if let Some(max) = max_instances {
                if set.len() >= max as usize {
                    return Err(Error::CannotCreate);
                }
            }
            if !set.insert(instance_id) {
                return Err(Error::CannotCreate);
            }
        }
        self.queue_change(Path::instance(object_id, instance_id));
        Ok(())
    }

    pub fn delete_object_instance(&self, object_id: ObjectId, instance_id: InstanceId) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let removed = inner.instances.get_mut(&object_id).map(|set| set.remove(&instance_id)).unwrap_or(false);
            if !removed {
                return Err(Error::CannotDelete);
            }
            inner.present.retain(|(o, i, _)| !(*o == object_id && *i == instance_id));
        }
        self.queue_change(Path::instance(object_id, instance_id));
        Ok(())
    }

    /// Marks an optional resource present within an already-created
    /// instance, mirroring `AwaStaticClient_CreateResource`.
    pub fn create_resource(&self, object_id: ObjectId, instance_id: InstanceId, resource_id: ResourceId) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.registry.get_resource_definition(object_id, resource_id).is_none() {
                return Err(Error::NotDefined);
            }
            if !inner.instances.get(&object_id).map_or(false, |set| set.contains(&instance_id)) {
                return Err(Error::NotDefined);
            }
            if !inner.present.insert((object_id, instance_id, resource_id)) {
                return Err(Error::CannotCreate);
            }
        }
        self.queue_change(Path::resource(object_id, instance_id, resource_id));
        Ok(())
    }

    pub fn delete_resource(&self, object_id: ObjectId, instance_id: InstanceId, resource_id: ResourceId) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.present.remove(&(object_id, instance_id, resource_id)) {
                return Err(Error::CannotDelete);
            }
        }
        self.queue_change(Path::resource(object_id, instance_id, resource_id));
        Ok(())
    }

    /// Tells the engine a pointer-bound resource's backing memory changed
    /// outside of `write_resource` (e.g. the application wrote through the
    /// pointer directly), so it is included in the next round of change
    /// notifications. Mirrors `AwaStaticClient_ResourceChanged`.
    pub fn resource_changed(&self, object_id: ObjectId, instance_id: InstanceId, resource_id: ResourceId) -> Result<()> {
        if self.inner.borrow().registry.get_resource_definition(object_id, resource_id).is_none() {
            return Err(Error::NotDefined);
        }
        self.queue_change(Path::resource(object_id, instance_id, resource_id));
        Ok(())
    }

    /// Mirrors `AwaStaticClient_ObjectInstanceChanged`.
    pub fn object_instance_changed(&self, object_id: ObjectId, instance_id: InstanceId) -> Result<()> {
        self.queue_change(Path::instance(object_id, instance_id));
        Ok(())
    }

    fn queue_change(&self, path: Path) {
        self.inner.borrow_mut().changed.push_back(path);
    }

    /// Drains and returns every path queued as changed since the last
    /// call, innermost writes and explicit `*_changed()` calls alike.
    pub fn take_changed(&self) -> Vec<Path> {
        self.inner.borrow_mut().changed.drain(..).collect()
    }

    /// Returns the raw pointer backing a pointer/pointer-array bound
    /// resource instance, mirroring
    /// `AwaStaticClient_GetResourceInstancePointer`. Handler-bound
    /// resources have no such pointer and report `Unsupported`.
    pub fn get_resource_instance_pointer(
        &self,
        object_id: ObjectId,
        instance_id: InstanceId,
        resource_id: ResourceId,
    ) -> Result<*mut u8> {
        let inner = self.inner.borrow();
        match inner.storage.get(&(object_id, resource_id)) {
            Some(ResourceStorage::Pointer(binding)) => Ok(binding.raw_ptr(instance_id.value())),
            Some(ResourceStorage::PointerArray(binding)) => binding.raw_ptr(instance_id.value()),
            Some(ResourceStorage::Handler(_)) => Err(Error::Unsupported),
            None => Err(Error::NotDefined),
        }
    }

    /// Reads a resource through whatever storage it is bound to —
    /// decoding native bytes for pointer storage, invoking the handler for
    /// handler-bound storage.
    pub fn read_resource(&self, object_id: ObjectId, instance_id: InstanceId, resource_id: ResourceId) -> Result<ResourceValue> {
        let kind = self
            .inner
            .borrow()
            .registry
            .get_resource_definition(object_id, resource_id)
            .ok_or(Error::NotDefined)?
            .kind;

        let is_handler = matches!(
            self.inner.borrow().storage.get(&(object_id, resource_id)),
            Some(ResourceStorage::Handler(_))
        );
        if is_handler {
            let response = self.dispatch_handler(object_id, instance_id, resource_id, None, HandlerOperation::Read, None)?;
            if !response.result.is_success() {
                return Err(result_to_error(response.result));
            }
            return response.value.ok_or_else(|| Error::Internal("handler returned no value for Read".into()));
        }

        let inner = self.inner.borrow();
        match inner.storage.get(&(object_id, resource_id)) {
            Some(ResourceStorage::Pointer(binding)) => decode_native(kind, &binding.read(instance_id.value())),
            Some(ResourceStorage::PointerArray(binding)) => decode_native(kind, &binding.read(instance_id.value())?),
            Some(ResourceStorage::Handler(_)) => unreachable!("checked above"),
            None => Err(Error::NotDefined),
        }
    }

    /// Writes a resource through whatever storage it is bound to. Pointer
    /// and pointer-array storage always queues a change notification (the
    /// engine owns the comparison there); a handler-bound resource queues
    /// one only when the handler reports `changed = true` on its
    /// [`HandlerResponse`] (spec §4.F's Write contract).
    pub fn write_resource(
        &self,
        object_id: ObjectId,
        instance_id: InstanceId,
        resource_id: ResourceId,
        value: ResourceValue,
    ) -> Result<()> {
        self.inner.borrow().registry.check_type(object_id, resource_id, &value)?;

        let is_handler = matches!(
            self.inner.borrow().storage.get(&(object_id, resource_id)),
            Some(ResourceStorage::Handler(_))
        );
        let should_notify = if is_handler {
            let response =
                self.dispatch_handler(object_id, instance_id, resource_id, None, HandlerOperation::Write, Some(value))?;
            if !response.result.is_success() {
                return Err(result_to_error(response.result));
            }
            response.changed
        } else {
            let inner = self.inner.borrow();
            match inner.storage.get(&(object_id, resource_id)) {
                Some(ResourceStorage::Pointer(binding)) => binding.write(instance_id.value(), &encode_native(&value)),
                Some(ResourceStorage::PointerArray(binding)) => binding.write(instance_id.value(), &encode_native(&value))?,
                Some(ResourceStorage::Handler(_)) => unreachable!("checked above"),
                None => return Err(Error::NotDefined),
            }
            true
        };
        if should_notify {
            self.queue_change(Path::resource(object_id, instance_id, resource_id));
        }
        Ok(())
    }

    /// Temporarily removes a handler-bound resource's boxed handler from
    /// storage, invokes it with an owned value, then reinserts it — so a
    /// handler implementation can freely call back into this client's own
    /// mutating methods (e.g. `resource_changed`) without re-entering its
    /// own borrow.
    fn dispatch_handler(
        &self,
        object_id: ObjectId,
        instance_id: InstanceId,
        resource_id: ResourceId,
        resource_instance_id: Option<u16>,
        operation: HandlerOperation,
        value: Option<ResourceValue>,
    ) -> Result<HandlerResponse> {
        let entry = self.inner.borrow_mut().storage.remove(&(object_id, resource_id));
        let mut handler = match entry {
            Some(ResourceStorage::Handler(handler)) => handler,
            Some(other) => {
                self.inner.borrow_mut().storage.insert((object_id, resource_id), other);
                return Err(Error::TypeMismatch);
            }
            None => return Err(Error::NotDefined),
        };

        let request = HandlerRequest { operation, object_id, instance_id, resource_id, resource_instance_id, value };
        let response = handler.handle(request);

        self.inner.borrow_mut().storage.insert((object_id, resource_id), ResourceStorage::Handler(handler));
        Ok(response)
    }

    /// Dispatches a single request delivered by the transport (spec §4.F).
    /// Used internally by [`Self::process`]; exposed so a transport
    /// implementation or a test can drive dispatch directly without a full
    /// `process()` tick.
    pub fn dispatch_request(&self, request: IncomingRequest) -> Result<()> {
        match request.operation {
            HandlerOperation::Read => {
                let resource_id = request.resource_id.ok_or_else(|| Error::PathInvalid("missing resource id".into()))?;
                let value = self.read_resource(request.object_id, request.instance_id, resource_id)?;
                let bytes = encode_native(&value);
                self.inner.borrow_mut().transport.send_response(&bytes);
            }
            HandlerOperation::Write => {
                let resource_id = request.resource_id.ok_or_else(|| Error::PathInvalid("missing resource id".into()))?;
                let kind = self
                    .inner
                    .borrow()
                    .registry
                    .get_resource_definition(request.object_id, resource_id)
                    .ok_or(Error::NotDefined)?
                    .kind;
                let value = decode_native(kind, &request.payload)?;
                self.write_resource(request.object_id, request.instance_id, resource_id, value)?;
            }
            HandlerOperation::Execute => {
                let resource_id = request.resource_id.ok_or_else(|| Error::PathInvalid("missing resource id".into()))?;
                let response = self.dispatch_handler(
                    request.object_id,
                    request.instance_id,
                    resource_id,
                    None,
                    HandlerOperation::Execute,
                    Some(ResourceValue::Opaque(Opaque(request.payload.clone()))),
                )?;
                if !response.result.is_success() {
                    return Err(result_to_error(response.result));
                }
            }
            HandlerOperation::CreateObjectInstance => {
                self.create_object_instance(request.object_id, request.instance_id)?;
            }
            HandlerOperation::DeleteObjectInstance => {
                self.delete_object_instance(request.object_id, request.instance_id)?;
            }
            HandlerOperation::CreateResource => {
                let resource_id = request.resource_id.ok_or_else(|| Error::PathInvalid("missing resource id".into()))?;
                self.create_resource(request.object_id, request.instance_id, resource_id)?;
            }
            HandlerOperation::DeleteResource => {
                let resource_id = request.resource_id.ok_or_else(|| Error::PathInvalid("missing resource id".into()))?;
                self.delete_resource(request.object_id, request.instance_id, resource_id)?;
            }
        }
        Ok(())
    }

    /// Cooperative tick (spec §4.F, §9 design note): drains every request
    /// the transport currently has ready, dispatching each, then returns
    /// how many milliseconds may pass before the caller needs to call
    /// `process()` again. Never blocks beyond `timeout`.
    pub fn process(&self, timeout: Duration) -> Result<u64> {
        if !self.inner.borrow().initialized {
            return Err(Error::StaticClientNotInitialized);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let request = self.inner.borrow_mut().transport.poll();
            let Some(request) = request else { break };
            // A single bad request must not stop the tick from draining
            // the rest of the transport's queue.
            let _ = self.dispatch_request(request);
            if Instant::now() >= deadline {
                break;
            }
        }
        Ok(self.inner.borrow().transport.next_call_ms().unwrap_or(DEFAULT_TICK_MS))
    }
}

fn result_to_error(result: LwM2MResult) -> Error {
    use lwm2m_types::LwM2MError as L;
    match result {
        LwM2MResult::BadRequest => Error::LWM2MError(L::BadRequest),
        LwM2MResult::Unauthorized | LwM2MResult::Forbidden => Error::LWM2MError(L::Unauthorized),
        LwM2MResult::NotFound => Error::PathNotFound,
        LwM2MResult::MethodNotAllowed => Error::LWM2MError(L::MethodNotAllowed),
        LwM2MResult::NotAcceptable => Error::LWM2MError(L::NotAcceptable),
        LwM2MResult::InternalError => Error::Internal("handler reported an internal error".into()),
        LwM2MResult::OutOfMemory => Error::OutOfMemory,
        LwM2MResult::Unsupported => Error::Unsupported,
        LwM2MResult::Success
        | LwM2MResult::SuccessCreated
        | LwM2MResult::SuccessDeleted
        | LwM2MResult::SuccessChanged
        | LwM2MResult::SuccessContent => unreachable!("success results never route through result_to_error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResponse;
    use lwm2m_types::ResourceKind;

    fn device_object(client: &StaticClient) {
        client.define_object(ObjectId(3), "Device", 1, Some(1)).unwrap();
        client
            .define_resource(ObjectId(3), ResourceId(9), "BatteryLevel", ResourceKind::Integer, 1, Some(1), AccessMode::ReadWrite)
            .unwrap();
        client.create_object_instance(ObjectId(3), InstanceId(0)).unwrap();
    }

    #[test]
    fn pointer_bound_write_is_visible_through_the_raw_pointer() {
        let client = StaticClient::new();
        device_object(&client);
        let mut backing = [0u8; 8];
        client
            .set_resource_storage_with_pointer(ObjectId(3), ResourceId(9), backing.as_mut_ptr(), 8, 8)
            .unwrap();

        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(87)).unwrap();
        assert_eq!(i64::from_le_bytes(backing), 87);

        let read_back = client.read_resource(ObjectId(3), InstanceId(0), ResourceId(9)).unwrap();
        assert_eq!(read_back, ResourceValue::Integer(87));
    }

    #[test]
    fn write_resource_queues_a_change_notification() {
        let client = StaticClient::new();
        device_object(&client);
        let mut backing = [0u8; 8];
        client
            .set_resource_storage_with_pointer(ObjectId(3), ResourceId(9), backing.as_mut_ptr(), 8, 8)
            .unwrap();

        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(5)).unwrap();
        let changed = client.take_changed();
        assert_eq!(changed, vec![Path::resource(ObjectId(3), InstanceId(0), ResourceId(9))]);
        assert!(client.take_changed().is_empty());
    }

    #[test]
    fn handler_write_queues_a_change_only_when_the_handler_reports_changed() {
        let client = StaticClient::new();
        device_object(&client);
        client
            .set_resource_operation_handler(ObjectId(3), ResourceId(9), |req: HandlerRequest| match req.operation {
                HandlerOperation::Write => {
                    let new_value = req.value.as_ref().and_then(ResourceValue::as_integer).unwrap_or(0);
                    HandlerResponse::ok(LwM2MResult::SuccessChanged).changed(new_value != 1)
                }
                _ => HandlerResponse::ok(LwM2MResult::MethodNotAllowed),
            })
            .unwrap();

        // Writing the value the handler treats as "unchanged" must not queue a notification.
        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(1)).unwrap();
        assert!(client.take_changed().is_empty());

        // A write the handler reports as an actual change does queue one.
        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(2)).unwrap();
        assert_eq!(client.take_changed(), vec![Path::resource(ObjectId(3), InstanceId(0), ResourceId(9))]);
    }

    #[test]
    fn handler_bound_resource_read_and_write_round_trip_through_dispatch() {
        let client = StaticClient::new();
        device_object(&client);
        client
            .set_resource_operation_handler(ObjectId(3), ResourceId(9), |req: HandlerRequest| match req.operation {
                HandlerOperation::Write => HandlerResponse::ok(LwM2MResult::SuccessChanged),
                HandlerOperation::Read => HandlerResponse::with_value(LwM2MResult::SuccessContent, ResourceValue::Integer(42)),
                _ => HandlerResponse::ok(LwM2MResult::MethodNotAllowed),
            })
            .unwrap();

        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(1)).unwrap();
        let value = client.read_resource(ObjectId(3), InstanceId(0), ResourceId(9)).unwrap();
        assert_eq!(value, ResourceValue::Integer(42));
    }

    #[test]
    fn handler_can_call_back_into_the_client_without_panicking() {
        let client = StaticClient::new();
        device_object(&client);
        client
            .set_resource_operation_handler(ObjectId(3), ResourceId(9), |_req: HandlerRequest| {
                HandlerResponse::ok(LwM2MResult::SuccessChanged)
            })
            .unwrap();
        // The handler above doesn't call back in, but the removal/reinsertion
        // dance must still leave the binding usable for a second dispatch.
        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(1)).unwrap();
        client.write_resource(ObjectId(3), InstanceId(0), ResourceId(9), ResourceValue::Integer(2)).unwrap();
    }

    #[test]
    fn process_before_init_is_not_initialized() {
        let client = StaticClient::new();
        assert_eq!(client.process(Duration::from_millis(10)).unwrap_err(), Error::StaticClientNotInitialized);
    }

    #[test]
    fn init_requires_endpoint_name_and_bootstrap() {
        let client = StaticClient::new();
        assert_eq!(client.init().unwrap_err(), Error::StaticClientNotConfigured);
        client.set_endpoint_name("urn:imei:1234").unwrap();
        assert_eq!(client.init().unwrap_err(), Error::StaticClientNotConfigured);
        client.set_bootstrap_server_uri("coap://127.0.0.1:5683").unwrap();
        assert!(client.init().is_ok());
    }

    #[test]
    fn creating_more_instances_than_max_is_rejected() {
        let client = StaticClient::new();
        client.define_object(ObjectId(4), "Connectivity", 0, Some(1)).unwrap();
        client.create_object_instance(ObjectId(4), InstanceId(0)).unwrap();
        assert_eq!(client.create_object_instance(ObjectId(4), InstanceId(1)).unwrap_err(), Error::CannotCreate);
    }

    #[test]
    fn dispatch_request_drives_a_full_write_then_read_cycle() {
        let client = StaticClient::new();
        device_object(&client);
        let mut backing = [0u8; 8];
        client
            .set_resource_storage_with_pointer(ObjectId(3), ResourceId(9), backing.as_mut_ptr(), 8, 8)
            .unwrap();

        client
            .dispatch_request(IncomingRequest {
                operation: HandlerOperation::Write,
                object_id: ObjectId(3),
                instance_id: InstanceId(0),
                resource_id: Some(ResourceId(9)),
                payload: 99i64.to_le_bytes().to_vec(),
            })
            .unwrap();
        assert_eq!(i64::from_le_bytes(backing), 99);

        client
            .dispatch_request(IncomingRequest {
                operation: HandlerOperation::Read,
                object_id: ObjectId(3),
                instance_id: InstanceId(0),
                resource_id: Some(ResourceId(9)),
                payload: Vec::new(),
            })
            .unwrap();
    }
}
