//! Type identification keys.
//!
//! [`TypeKey`] identifies a capability or an implementation inside the
//! container. Capabilities are usually trait objects (`dyn Trait`), so keys
//! are built for `?Sized` types.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use bindery_support::rendering::short_type_name;

/// Identifies a Rust type in the binding and component tables.
///
/// Equality and hashing only look at the [`TypeId`]; the type name is kept
/// for diagnostics.
///
/// # Examples
/// ```
/// use bindery_container::key::TypeKey;
///
/// trait ProductParser {}
///
/// let key = TypeKey::of::<dyn ProductParser>();
/// assert_eq!(key.short_name(), "dyn ProductParser");
/// assert_eq!(key, TypeKey::of::<dyn ProductParser>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Creates the key for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name with module paths stripped.
    pub fn short_name(&self) -> String {
        short_type_name(self.type_name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.type_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}
