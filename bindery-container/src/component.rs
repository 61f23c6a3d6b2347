//! Components and their dependency slots.
//!
//! A [`Component`] is a concrete type the container knows how to build.
//! Implementing the trait (by hand or with `#[derive(Component)]`) and
//! registering the type on the builder is what makes it a valid target for
//! a binding.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use bindery_container::component::{Component, Slot};
//! use bindery_container::error::Result;
//! use bindery_container::registry::Resolver;
//!
//! trait FileReader: Send + Sync {}
//!
//! struct ProductParser {
//!     reader: Arc<dyn FileReader>,
//! }
//!
//! impl Component for ProductParser {
//!     fn slots() -> Vec<Slot> {
//!         vec![Slot::new::<dyn FileReader>("reader")]
//!     }
//!
//!     fn construct(resolver: &dyn Resolver) -> Result<Self> {
//!         Ok(Self { reader: resolver.inject::<dyn FileReader>("reader")? })
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::Result;
use crate::key::TypeKey;
use crate::registry::Resolver;

/// A concrete type the container can construct.
///
/// `construct` is the component's factory: it receives a [`Resolver`] and
/// must fill every dependency slot through it. Errors from the resolver are
/// returned unchanged so the caller sees the deepest cause; failures of the
/// component's own setup should be wrapped with
/// [`BinderyError::instantiation`](crate::error::BinderyError::instantiation).
pub trait Component: Sized + Send + Sync + 'static {
    /// The slots `construct` will fill, used for build-time graph checks.
    fn slots() -> Vec<Slot> {
        Vec::new()
    }

    /// Builds a fully wired instance.
    fn construct(resolver: &dyn Resolver) -> Result<Self>;
}

/// A named dependency position on a component, typed as a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    name: &'static str,
    capability: TypeKey,
}

impl Slot {
    /// Declares a slot for capability `C`.
    pub fn new<C: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            capability: TypeKey::of::<C>(),
        }
    }

    /// Declares a slot from the field type that holds it.
    ///
    /// `Slot::of::<Arc<dyn Reader>>("reader")` is `Slot::new::<dyn Reader>("reader")`.
    pub fn of<F: Injectable>(name: &'static str) -> Self {
        Self::new::<F::Capability>(name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capability(&self) -> TypeKey {
        self.capability
    }
}

/// Field types that can hold an injected capability.
pub trait Injectable: Sized {
    /// The capability resolved for this field.
    type Capability: ?Sized + Send + Sync + 'static;

    /// Resolves the capability and converts it into the field value.
    fn inject(resolver: &dyn Resolver, slot: &'static str) -> Result<Self>;
}

impl<C: ?Sized + Send + Sync + 'static> Injectable for Arc<C> {
    type Capability = C;

    fn inject(resolver: &dyn Resolver, slot: &'static str) -> Result<Self> {
        resolver.inject::<C>(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Reader: Send + Sync {}

    #[test]
    fn slot_from_field_type() {
        assert_eq!(
            Slot::of::<Arc<dyn Reader>>("reader"),
            Slot::new::<dyn Reader>("reader")
        );
    }

    #[test]
    fn slot_accessors() {
        let slot = Slot::new::<dyn Reader>("reader");
        assert_eq!(slot.name(), "reader");
        assert_eq!(slot.capability(), TypeKey::of::<dyn Reader>());
    }

    #[test]
    fn default_slots_are_empty() {
        struct Leaf;
        impl Component for Leaf {
            fn construct(_: &dyn Resolver) -> Result<Self> {
                Ok(Leaf)
            }
        }

        assert!(Leaf::slots().is_empty());
    }
}
