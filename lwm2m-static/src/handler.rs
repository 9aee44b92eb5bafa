//! Callback-based resource storage (spec §4.F), mirroring
//! `AwaStaticClient_RegisterResourceWithHandler` from
//! `original_source/api/include/awa/static.h`.
//!
//! The C API passes the handler a `void *context` set once via
//! `AwaStaticClient_SetApplicationContext`. Per §9's design note on
//! "callback with untyped context pointer", that indirection is dropped
//! here: a [`ResourceHandler`] is a plain trait object, so any state the
//! handler needs is simply captured in the closure or struct that
//! implements it.

use lwm2m_types::{InstanceId, ObjectId, ResourceId, ResourceValue};

/// Mirrors `AwaLwm2mResult` from `original_source/api/include/awa/static.h`
/// — the result a handler reports for the request it was given, distinct
/// from [`lwm2m_types::Error`] (that enum is for this crate's own Rust API
/// surface; this one is the CoAP-flavoured outcome a handler hands back to
/// the static client engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LwM2MResult {
    Success,
    SuccessCreated,
    SuccessDeleted,
    SuccessChanged,
    SuccessContent,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    InternalError,
    OutOfMemory,
    Unsupported,
}

impl LwM2MResult {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            LwM2MResult::Success
                | LwM2MResult::SuccessCreated
                | LwM2MResult::SuccessDeleted
                | LwM2MResult::SuccessChanged
                | LwM2MResult::SuccessContent
        )
    }
}

/// The operation a handler is being asked to perform, shared with
/// [`crate::transport::IncomingRequest`] since both the local dispatch path
/// (`create_resource`, `resource_changed`, ...) and the transport-facing
/// path describe requests the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOperation {
    CreateObjectInstance,
    DeleteObjectInstance,
    CreateResource,
    DeleteResource,
    Read,
    Write,
    Execute,
}

/// The target and payload a [`ResourceHandler`] is invoked with. `value` is
/// `Some` for `Write`/`Execute` (execute's payload rides in as an
/// `Opaque`), `None` for the other operations, and `Read` is answered by
/// returning a value from the call rather than consulting this field.
pub struct HandlerRequest {
    pub operation: HandlerOperation,
    pub object_id: ObjectId,
    pub instance_id: InstanceId,
    pub resource_id: ResourceId,
    pub resource_instance_id: Option<u16>,
    pub value: Option<ResourceValue>,
}

/// Outcome of a handler invocation: the CoAP-flavoured result, a value for
/// `Read` (ignored for every other operation), and for `Write` whether the
/// stored value actually differs after the write was applied — spec §4.F's
/// "set `*changed = true` iff the stored value differs after applying the
/// write (used to decide whether to emit a change notification)", mirroring
/// `original_source/api/include/awa/static.h`'s `changed` out-parameter.
/// Defaults to `false`; a handler implementing `Write` must opt in via
/// [`Self::changed`] when it actually modified the stored value.
pub struct HandlerResponse {
    pub result: LwM2MResult,
    pub value: Option<ResourceValue>,
    pub changed: bool,
}

impl HandlerResponse {
    pub fn ok(result: LwM2MResult) -> Self {
        Self { result, value: None, changed: false }
    }

    pub fn with_value(result: LwM2MResult, value: ResourceValue) -> Self {
        Self { result, value: Some(value), changed: false }
    }

    /// Marks a `Write` response as having actually modified the stored
    /// value, so the engine queues a change notification for it.
    pub fn changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }
}

/// A resource whose storage is entirely owned by the application, invoked
/// for every create/delete/read/write/execute the engine dispatches at it
/// (spec §4.F "handler-bound resource").
///
/// Handlers are invoked through [`crate::client::StaticClient`]'s own
/// dispatch path, which temporarily removes the boxed handler from its
/// storage map before calling it and reinserts it afterwards — so a
/// handler implementation is free to call back into `StaticClient`'s own
/// mutating methods (e.g. `resource_changed`) without deadlocking or
/// panicking on a re-entrant borrow.
pub trait ResourceHandler: Send {
    fn handle(&mut self, request: HandlerRequest) -> HandlerResponse;
}

/// Adapts a plain closure to [`ResourceHandler`], for the common case where
/// a handler needs no additional state beyond what it captures.
impl<F> ResourceHandler for F
where
    F: FnMut(HandlerRequest) -> HandlerResponse + Send,
{
    fn handle(&mut self, request: HandlerRequest) -> HandlerResponse {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_variants_report_success() {
        assert!(LwM2MResult::SuccessCreated.is_success());
        assert!(!LwM2MResult::NotFound.is_success());
    }

    #[test]
    fn closure_handler_is_invocable_through_the_trait() {
        let mut handler: Box<dyn ResourceHandler> = Box::new(|req: HandlerRequest| {
            assert_eq!(req.operation, HandlerOperation::Read);
            HandlerResponse::with_value(LwM2MResult::SuccessContent, ResourceValue::Integer(9))
        });
        let response = handler.handle(HandlerRequest {
            operation: HandlerOperation::Read,
            object_id: ObjectId(3),
            instance_id: InstanceId(0),
            resource_id: ResourceId(1),
            resource_instance_id: None,
            value: None,
        });
        assert_eq!(response.value, Some(ResourceValue::Integer(9)));
    }
}
