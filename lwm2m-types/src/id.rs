//! Object/Instance/Resource identifiers.
//!
//! Identifiers are 16-bit unsigned integers on the wire and in storage
//! (`0..=65535`); APIs that need to express "this component is absent" take
//! a signed `i32` and use [`INVALID_ID`] as the sentinel, matching the
//! source API's `int` + `-1` convention rather than inventing an `Option`
//! at every call site that crosses the API boundary.

use std::fmt;

/// Sentinel for an absent identifier in signed-integer APIs.
pub const INVALID_ID: i32 = -1;

/// Largest value representable by a 16-bit identifier.
pub const MAX_ID: u16 = u16::MAX;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub u16);

        impl $name {
            pub fn new(value: u16) -> Self {
                Self(value)
            }

            pub fn value(self) -> u16 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u16> for $name {
            fn from(value: u16) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u16 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0 as i32
            }
        }
    };
}

id_newtype!(ObjectId);
id_newtype!(InstanceId);
id_newtype!(ResourceId);
id_newtype!(ResourceInstanceId);

/// Convert a signed component as returned by a `path_to_ids`-style API back
/// into a typed identifier, treating [`INVALID_ID`] as absence.
pub fn signed_to_option<T: From<u16>>(value: i32) -> Option<T> {
    if value == INVALID_ID {
        None
    } else {
        u16::try_from(value).ok().map(T::from)
    }
}

/// The inverse of [`signed_to_option`]: render an absent component as
/// [`INVALID_ID`] for APIs that take a flat `i32`.
pub fn option_to_signed<T: Into<i32>>(value: Option<T>) -> i32 {
    value.map(Into::into).unwrap_or(INVALID_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_round_trip() {
        assert_eq!(signed_to_option::<ObjectId>(INVALID_ID), None);
        assert_eq!(signed_to_option::<ObjectId>(7), Some(ObjectId(7)));
        assert_eq!(option_to_signed(Some(ObjectId(7))), 7);
        assert_eq!(option_to_signed::<ObjectId>(None), INVALID_ID);
    }
}
