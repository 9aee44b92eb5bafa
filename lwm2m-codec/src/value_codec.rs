//! Textual value encoding for the wire (§4.B, §6): opaque is base64, string
//! is raw text, booleans are `True`/`False`, floats/integers are decimal,
//! object links are `O:I`. An empty `Value` text denotes an explicit empty
//! payload, not an absent one.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lwm2m_types::{Error, ObjectLink, Opaque, Result};

/// Encode a single scalar value for the wire. Callers of array values
/// encode each resource-instance value independently (`tree.rs` walks the
/// sparse map and emits one `ResourceInstance` per present index).
pub fn encode_scalar(value: &lwm2m_types::ResourceValue) -> Option<String> {
    use lwm2m_types::ResourceValue::*;
    match value {
        None => Option::None,
        String(s) => Some(s.clone()),
        Integer(v) => Some(v.to_string()),
        Float(v) => Some(format_float(*v)),
        Boolean(v) => Some(if *v { "True".to_string() } else { "False".to_string() }),
        Opaque(o) => Some(BASE64.encode(&o.0)),
        Time(v) => Some(v.to_string()),
        ObjectLink(link) => Some(link.to_string()),
        _ => Option::None, // array kinds are not scalar-encodable
    }
}

/// Round-trip-precise decimal rendering: integral floats keep a trailing
/// `.0` so the decoded value is recognisably a `Float`, not an `Integer`.
fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Decode a scalar text value against its defined kind.
pub fn decode_scalar(kind: lwm2m_types::ResourceKind, text: &str) -> Result<lwm2m_types::ResourceValue> {
    use lwm2m_types::ResourceKind as K;
    use lwm2m_types::ResourceValue as V;
    Ok(match kind {
        K::None => V::None,
        K::String => V::String(text.to_string()),
        K::Integer => V::Integer(text.parse().map_err(|_| Error::TypeMismatch)?),
        K::Float => V::Float(text.parse().map_err(|_| Error::TypeMismatch)?),
        K::Boolean => V::Boolean(match text {
            "True" => true,
            "False" => false,
            _ => return Err(Error::TypeMismatch),
        }),
        K::Opaque => V::Opaque(Opaque(BASE64.decode(text).map_err(|_| Error::TypeMismatch)?)),
        K::Time => V::Time(text.parse().map_err(|_| Error::TypeMismatch)?),
        K::ObjectLink => V::ObjectLink(text.parse::<ObjectLink>()?),
        _ => return Err(Error::TypeMismatch), // array kinds decoded per-instance by tree.rs
    })
}
