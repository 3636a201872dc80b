//! Binding key types for the injection container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::describe::TypeDescriptor;

/// Identity of a requested dependency: a type plus an optional string tag.
///
/// Two keys are equal iff their type and tag match. The type name is kept for
/// diagnostics only and takes no part in comparisons.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::Key;
///
/// let plain = Key::of::<u16>();
/// let port = Key::tagged::<u16>("port");
///
/// assert_ne!(plain, port);
/// assert_eq!(port, Key::tagged::<u16>("port"));
/// assert_eq!(port.tag(), Some("port"));
/// assert_eq!(port.type_name(), "u16");
/// assert_eq!(port.to_string(), "u16(tag=port)");
/// ```
#[derive(Clone)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    tag: Option<Arc<str>>,
}

impl Key {
    /// Untagged key for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            tag: None,
        }
    }

    /// Tagged key for `T`.
    pub fn tagged<T: ?Sized + 'static>(tag: impl Into<Arc<str>>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::of::<T>()
        }
    }

    pub(crate) fn from_descriptor(ty: &TypeDescriptor, tag: Option<Arc<str>>) -> Self {
        Self {
            type_id: ty.id(),
            type_name: ty.name(),
            tag,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name for display, as given by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// The same type without its tag.
    pub fn untagged(&self) -> Key {
        Key {
            tag: None,
            ..self.clone()
        }
    }
}

impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.tag == other.tag
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.tag.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}(tag={})", self.type_name, tag),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

/// Untagged key for `T`.
#[inline]
pub fn key_of<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tag_takes_part_in_identity() {
        let mut keys = HashSet::new();
        keys.insert(Key::of::<String>());
        keys.insert(Key::tagged::<String>("a"));
        keys.insert(Key::tagged::<String>("b"));
        keys.insert(Key::tagged::<String>("a".to_string()));

        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&Key::tagged::<String>("b")));
    }

    #[test]
    fn test_untagged_drops_only_the_tag() {
        let key = Key::tagged::<u32>("workers");
        assert_eq!(key.untagged(), key_of::<u32>());
        assert!(!key.untagged().is_tagged());
    }

    #[test]
    fn test_unsized_types_have_keys() {
        trait Marker {}
        let key = Key::of::<dyn Marker>();
        assert!(key.type_name().contains("Marker"));
        assert_eq!(format!("{:?}", key), format!("Key({})", key.type_name()));
    }
}
