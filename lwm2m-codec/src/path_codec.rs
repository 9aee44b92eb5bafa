//! Path grammar: `"/" component ("/" component){0..3}`, component a decimal
//! integer in `[0, 65535]` (spec §4.B). Parsing is strict: leading slash
//! required, no trailing slash, decimal digits only, components in range.

use lwm2m_types::{Error, InstanceId, ObjectId, Path, ResourceId, ResourceInstanceId, Result, INVALID_ID};

/// The four path components as they cross the API boundary: present
/// components as their value, absent components as [`INVALID_ID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathIds {
    pub object: i32,
    pub instance: i32,
    pub resource: i32,
    pub resource_instance: i32,
}

fn parse_component(s: &str) -> Result<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::PathInvalid(format!("non-decimal component: {s:?}")));
    }
    s.parse::<u16>()
        .map_err(|_| Error::PathInvalid(format!("component out of range: {s:?}")))
}

/// Parses a canonical path string into the structured key.
pub fn parse_path(s: &str) -> Result<Path> {
    if !s.starts_with('/') {
        return Err(Error::PathInvalid("path must start with '/'".into()));
    }
    if s.len() > 1 && s.ends_with('/') {
        return Err(Error::PathInvalid("path must not end with '/'".into()));
    }
    let components: Vec<&str> = s[1..].split('/').collect();
    if components.is_empty() || components.len() > 4 {
        return Err(Error::PathInvalid(format!(
            "path must have between 1 and 4 components: {s:?}"
        )));
    }

    let object = ObjectId(parse_component(components[0])?);
    let instance = components.get(1).map(|c| parse_component(c)).transpose()?.map(InstanceId);
    let resource = components.get(2).map(|c| parse_component(c)).transpose()?.map(ResourceId);
    let resource_instance = components
        .get(3)
        .map(|c| parse_component(c))
        .transpose()?
        .map(ResourceInstanceId);

    Ok(Path {
        object,
        instance,
        resource,
        resource_instance,
    })
}

/// Formats the structured key back into its canonical string form.
pub fn format_path(path: &Path) -> String {
    path.to_string()
}

/// `path_to_ids(path) -> (O, I?, R?, i?)`, absent components reported as
/// `INVALID_ID` (spec §4.B).
pub fn path_to_ids(path: &str) -> Result<PathIds> {
    let parsed = parse_path(path)?;
    Ok(PathIds {
        object: parsed.object.value() as i32,
        instance: parsed.instance.map(|i| i.value() as i32).unwrap_or(INVALID_ID),
        resource: parsed.resource.map(|r| r.value() as i32).unwrap_or(INVALID_ID),
        resource_instance: parsed
            .resource_instance
            .map(|r| r.value() as i32)
            .unwrap_or(INVALID_ID),
    })
}

/// `ids_to_path(O, I?, R?, i?) -> path`, producing the canonical form.
/// Trailing components must be `INVALID_ID` once a gap appears — e.g. a
/// resource component without an instance component is malformed.
pub fn ids_to_path(object: i32, instance: i32, resource: i32, resource_instance: i32) -> Result<String> {
    let object = u16::try_from(object).map_err(|_| Error::IDInvalid)?;
    let mut parts = vec![object.to_string()];

    let instance = if instance == INVALID_ID { None } else { Some(u16::try_from(instance).map_err(|_| Error::IDInvalid)?) };
    let resource = if resource == INVALID_ID { None } else { Some(u16::try_from(resource).map_err(|_| Error::IDInvalid)?) };
    let resource_instance = if resource_instance == INVALID_ID {
        None
    } else {
        Some(u16::try_from(resource_instance).map_err(|_| Error::IDInvalid)?)
    };

    if resource.is_some() && instance.is_none() {
        return Err(Error::PathInvalid("resource component without instance component".into()));
    }
    if resource_instance.is_some() && resource.is_none() {
        return Err(Error::PathInvalid(
            "resource-instance component without resource component".into(),
        ));
    }

    if let Some(i) = instance {
        parts.push(i.to_string());
    }
    if let Some(r) = resource {
        parts.push(r.to_string());
    }
    if let Some(ri) = resource_instance {
        parts.push(ri.to_string());
    }

    Ok(format!("/{}", parts.join("/")))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn path_round_trip(o in 0u16..=65535, i in 0u16..=65535, r in 0u16..=65535, ri in 0u16..=65535) {
            let p = format!("/{o}/{i}/{r}/{ri}");
            let parsed = parse_path(&p).unwrap();
            prop_assert_eq!(format_path(&parsed), p);
        }
    }
}
