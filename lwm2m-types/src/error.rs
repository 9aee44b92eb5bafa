//! Single flat error enumeration, per the error-handling design: one enum,
//! no exception hierarchy, every category represented as a variant rather
//! than as a nested type.

use thiserror::Error;

/// CoAP-flavoured semantic failure reported by the daemon for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LwM2MError {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Timeout,
}

impl std::fmt::Display for LwM2MError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LwM2MError::BadRequest => "bad request",
            LwM2MError::Unauthorized => "unauthorized",
            LwM2MError::NotFound => "not found",
            LwM2MError::MethodNotAllowed => "method not allowed",
            LwM2MError::NotAcceptable => "not acceptable",
            LwM2MError::Timeout => "timeout (5.04)",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Session
    #[error("session invalid")]
    SessionInvalid,
    #[error("session not connected")]
    SessionNotConnected,
    #[error("IPC error: {0}")]
    IPCError(String),

    // Operation
    #[error("operation invalid")]
    OperationInvalid,
    #[error("add invalid")]
    AddInvalid,
    #[error("response invalid")]
    ResponseInvalid,
    #[error("timeout")]
    Timeout,
    #[error("overrun")]
    Overrun,

    // Path
    #[error("path invalid: {0}")]
    PathInvalid(String),
    #[error("path not found")]
    PathNotFound,
    #[error("id invalid")]
    IDInvalid,

    // Type / Definition
    #[error("not defined")]
    NotDefined,
    #[error("already defined")]
    AlreadyDefined,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("definition invalid: {0}")]
    DefinitionInvalid(String),
    #[error("range invalid")]
    RangeInvalid,

    // Subscription
    #[error("subscription invalid")]
    SubscriptionInvalid,
    #[error("observation invalid")]
    ObservationInvalid,
    #[error("already subscribed")]
    AlreadySubscribed,

    // Static client
    #[error("static client invalid")]
    StaticClientInvalid,
    #[error("static client not configured")]
    StaticClientNotConfigured,
    #[error("static client not initialized")]
    StaticClientNotInitialized,
    #[error("cannot create")]
    CannotCreate,
    #[error("cannot delete")]
    CannotDelete,
    #[error("log level invalid")]
    LogLevelInvalid,

    // Semantic (daemon-reported)
    #[error("daemon error: {0}")]
    LWM2MError(LwM2MError),

    // Miscellaneous
    #[error("unsupported")]
    Unsupported,
    #[error("unspecified")]
    Unspecified,
    #[error("internal: {0}")]
    Internal(String),
    #[error("out of memory")]
    OutOfMemory,
    #[error("response contains at least one per-path error")]
    Response,
    #[error("iterator invalid")]
    IteratorInvalid,
    #[error("client id invalid")]
    ClientIDInvalid,
    #[error("client not found")]
    ClientNotFound,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Per-path result carried in an operation's response, distinct from the
/// local `Error` returned by `add_*`/`perform` themselves (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    Success,
    PathNotFound,
    NotDefined,
    TypeMismatch,
    LWM2MError(LwM2MError),
    Timeout,
    Internal,
}

impl PathError {
    pub fn is_success(&self) -> bool {
        matches!(self, PathError::Success)
    }
}
