//! Factory bootstrap configuration (spec §4.F, §6 "Static-client factory
//! bootstrap blob").
//!
//! Grounded directly on `original_source/api/include/awa/static.h`'s
//! `AwaFactoryBootstrapInfo` struct: a security half (server URI, bootstrap
//! flag, security mode, identity/key/secret, server ID, hold-off) and a
//! server half (short server ID, lifetime, min/max periods, disable
//! timeout, notification flag, binding). The C struct's fixed `char[255]`/
//! `char[10]` buffers become owned `String`s here; `validate()` enforces
//! the same byte budgets so a too-long value is rejected rather than
//! silently truncated.

use lwm2m_types::{Error, Result};

const MAX_URI_LEN: usize = 255;
const MAX_KEY_LEN: usize = 255;
const MAX_BINDING_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    PreSharedKey,
    RawPublicKey,
    Certificate,
    NoSec,
}

/// LWM2M Security Object fields needed to bootstrap and connect without a
/// bootstrap server round trip.
#[derive(Debug, Clone)]
pub struct SecurityInfo {
    pub server_uri: String,
    pub bootstrap: bool,
    pub security_mode: SecurityMode,
    pub public_key_or_identity: String,
    pub secret_key: String,
    pub server_id: u16,
    pub hold_off_time: u32,
}

/// LWM2M Server Object fields paired with a [`SecurityInfo`] entry.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub short_server_id: u16,
    pub lifetime: u32,
    pub min_period: u32,
    pub max_period: u32,
    pub disable_timeout: u32,
    pub notification: bool,
    pub binding: String,
}

#[derive(Debug, Clone)]
pub struct FactoryBootstrapInfo {
    pub security: SecurityInfo,
    pub server: ServerInfo,
}

impl FactoryBootstrapInfo {
    pub fn validate(&self) -> Result<()> {
        if self.security.server_uri.is_empty() || self.security.server_uri.len() > MAX_URI_LEN {
            return Err(Error::DefinitionInvalid("server URI must be 1..=255 bytes".into()));
        }
        if self.security.public_key_or_identity.len() > MAX_KEY_LEN {
            return Err(Error::DefinitionInvalid("identity/public key exceeds 255 bytes".into()));
        }
        if self.security.secret_key.len() > MAX_KEY_LEN {
            return Err(Error::DefinitionInvalid("secret key exceeds 255 bytes".into()));
        }
        if self.server.binding.len() > MAX_BINDING_LEN {
            return Err(Error::DefinitionInvalid("binding string exceeds 10 bytes".into()));
        }
        if self.server.min_period > self.server.max_period {
            return Err(Error::DefinitionInvalid("min_period must not exceed max_period".into()));
        }
        Ok(())
    }
}
