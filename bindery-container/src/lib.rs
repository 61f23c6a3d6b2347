//! Core container implementation for bindery.

pub mod component;
pub mod container;
pub mod error;
pub mod key;
pub mod provider;
pub mod registry;

mod graph;

pub use container::{Container, ContainerBuilder, prelude};
pub use error::{BinderyError, Result};
pub use inventory;
pub use key::TypeKey;

/// Registers a component and binds a capability to it.
///
/// Expands to `.provide::<Capability, Implementation>(upcast)` on the given
/// builder (or `&mut Registrations`), with the unsizing upcast written out.
///
/// ```rust
/// use bindery_container::prelude::*;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
/// impl Component for SystemClock {
///     fn construct(_: &dyn Resolver) -> Result<Self> {
///         Ok(SystemClock)
///     }
/// }
///
/// let container = bind!(Container::builder(), dyn Clock => SystemClock)
///     .build()
///     .unwrap();
/// assert!(container.contains::<dyn Clock>());
/// ```
#[macro_export]
macro_rules! bind {
    ($builder:expr, $capability:ty => $implementation:ty) => {
        $builder.provide::<$capability, $implementation>(
            |component: ::std::sync::Arc<$implementation>| -> ::std::sync::Arc<$capability> {
                component
            },
        )
    };
}
