//! # The Container
//!
//! Resolves capabilities to fully wired singleton instances.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──resolve::<dyn C>()──> Arc<dyn C>
//!   components                    bindings (frozen)
//!   bindings                      cache    (capability → instance)
//! ```
//!
//! # Examples
//! ```rust
//! use bindery_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait FileReader: Send + Sync {
//!     fn read(&self) -> Vec<String>;
//! }
//!
//! struct FixtureReader;
//!
//! impl FileReader for FixtureReader {
//!     fn read(&self) -> Vec<String> {
//!         vec!["1,Apple,fruit,0.5".into()]
//!     }
//! }
//!
//! impl Component for FixtureReader {
//!     fn construct(_: &dyn Resolver) -> Result<Self> {
//!         Ok(FixtureReader)
//!     }
//! }
//!
//! let container = bind!(Container::builder(), dyn FileReader => FixtureReader)
//!     .build()
//!     .expect("Failed to build container");
//!
//! let reader = container.resolve::<dyn FileReader>().expect("Failed to resolve");
//! assert_eq!(reader.read().len(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use bindery_support::rendering::render_path;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use tracing::{debug, info, instrument, trace, warn};

use crate::component::Component;
use crate::error::{
    BinderyError, CyclicDependencyError, InvalidComponentError, InvalidReason, Result,
    UnboundCapabilityError,
};
use crate::graph::GraphValidator;
use crate::key::TypeKey;
use crate::provider::{self, Provider};
use crate::registry::{Instance, Registrations, Registry, Request, Resolver};

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from components and bindings.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .provide::<dyn FileReader, LocalFileReader>(|c| c)
///     .value::<dyn Clock>(Arc::new(SystemClock))
///     .add_provider(&ParsingProvider)
///     .build()?;
/// ```
pub struct ContainerBuilder {
    registrations: Registrations,
    validate: bool,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registrations: Registrations::new(),
            validate: true,
        }
    }

    /// Allow a later binding to replace an earlier one for the same capability.
    ///
    /// Applies to bindings registered after this call.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.registrations.set_allow_override(allow);
        self
    }

    /// Check the declared dependency graph in [`build()`](Self::build).
    ///
    /// On by default. When off, the same problems surface on `resolve()`.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Registers `I` as a constructible component.
    pub fn component<I: Component>(mut self) -> Self {
        self.registrations.component::<I>();
        self
    }

    /// Binds capability `C` to implementation `I`.
    ///
    /// See [`Registrations::bind`].
    pub fn bind<C, I>(mut self, upcast: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Send + Sync + 'static,
    {
        self.registrations.bind::<C, I>(upcast);
        self
    }

    /// Registers component `I` and binds capability `C` to it.
    ///
    /// The [`bind!`](crate::bind) macro writes the upcast for you.
    pub fn provide<C, I>(mut self, upcast: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Component,
    {
        self.registrations.provide::<C, I>(upcast);
        self
    }

    /// Binds capability `C` to a factory closure.
    pub fn factory<C: ?Sized + Send + Sync + 'static>(
        mut self,
        factory: impl Fn(&dyn Resolver) -> Result<Arc<C>> + Send + Sync + 'static,
    ) -> Self {
        self.registrations.factory::<C>(factory);
        self
    }

    /// Binds capability `C` to an already built instance.
    pub fn value<C: ?Sized + Send + Sync + 'static>(mut self, instance: Arc<C>) -> Self {
        self.registrations.value::<C>(instance);
        self
    }

    /// Add a [`Provider`] module.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(&mut self.registrations);
        self
    }

    /// Add every provider submitted with `inventory::submit!`.
    pub fn discover_providers(mut self) -> Self {
        for found in provider::discovered() {
            debug!(provider = found.name(), "Adding discovered provider");
            found.register(&mut self.registrations);
        }
        self
    }

    /// Direct access to the registration tables, e.g. for type-erased entries.
    pub fn registrations(&mut self) -> &mut Registrations {
        &mut self.registrations
    }

    /// Build the container.
    ///
    /// Reports the first registration error (such as a capability bound
    /// twice), then validates the dependency graph unless disabled.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        let (registry, errors) = self.registrations.finish();
        info!(bindings = registry.len(), "Building container");

        if let Some(first) = errors.into_iter().next() {
            warn!(error = %first, "Registration failed");
            return Err(first);
        }

        if self.validate {
            GraphValidator::new(&registry).validate()?;
        }

        info!("Container built");
        Ok(Container {
            registry,
            cache: DashMap::new(),
            resolving: ReentrantMutex::new(RefCell::new(Vec::new())),
        })
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("bindings", &self.registrations.len())
            .field("validate", &self.validate)
            .finish()
    }
}

// ============================================================
// Container
// ============================================================

/// Thread-safe dependency injection container with singleton instances.
///
/// Created by [`ContainerBuilder::build()`]. Every capability is built at
/// most once per container; later requests get the cached instance.
///
/// Construction runs under a re-entrant lock: nested resolves from the same
/// thread re-enter it, concurrent first requests from other threads wait, and
/// cache hits skip it entirely. A factory must not block on another thread
/// that resolves from the same container.
pub struct Container {
    registry: Registry,
    cache: DashMap<TypeKey, Instance>,
    /// Capabilities currently under construction, outermost first.
    resolving: ReentrantMutex<RefCell<Vec<TypeKey>>>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Resolve capability `C` to its singleton instance.
    ///
    /// ```rust,ignore
    /// let service: Arc<dyn ProductService> = container.resolve::<dyn ProductService>()?;
    /// ```
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        trace!(capability = %TypeKey::of::<C>(), "Resolving");
        let resolver: &dyn Resolver = self;
        resolver.resolve::<C>()
    }

    /// Returns `true` if capability `C` has a binding.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.registry.binding(&TypeKey::of::<C>()).is_some()
    }

    /// Returns `true` if capability `C` has already been built.
    pub fn is_cached<C: ?Sized + 'static>(&self) -> bool {
        self.cache.contains_key(&TypeKey::of::<C>())
    }

    /// Number of built instances.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of bound capabilities.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn resolve_for(&self, request: &Request, consumer: Option<TypeKey>) -> Result<Instance> {
        let capability = request.key();
        let binding = self.registry.binding(&capability).ok_or_else(|| {
            BinderyError::Unbound(UnboundCapabilityError {
                capability,
                required_by: consumer,
                suggestions: self.registry.suggestions(&capability),
            })
        })?;

        let component = self.registry.component(&binding.implementation).ok_or_else(|| {
            BinderyError::InvalidComponent(InvalidComponentError {
                capability,
                implementation: binding.implementation,
                reason: InvalidReason::NotAComponent,
            })
        })?;

        if let Some(instance) = self.cached(&capability) {
            trace!(capability = %capability, "Cache hit");
            return Ok(instance);
        }

        let guard = self.resolving.lock();

        // Another thread may have built it while we waited for the lock.
        if let Some(instance) = self.cached(&capability) {
            return Ok(instance);
        }

        let _frame = ResolutionFrame::enter(&guard, capability)?;

        debug!(
            capability = %capability,
            implementation = %component.implementation,
            "Constructing component"
        );

        let resolver = ComponentResolver {
            container: self,
            component: component.implementation,
        };
        let built = (component.factory)(&resolver)?;

        let instance = (binding.upcast)(built).ok_or_else(|| {
            BinderyError::InvalidComponent(InvalidComponentError {
                capability,
                implementation: component.implementation,
                reason: InvalidReason::WrongType,
            })
        })?;

        if !request.accepts(&instance) {
            warn!(
                capability = %capability,
                implementation = %component.implementation,
                "Discarding wrongly typed instance"
            );
            return Err(request.rejected(component.implementation, consumer));
        }

        self.cache.insert(capability, Arc::clone(&instance));
        Ok(instance)
    }

    fn cached(&self, capability: &TypeKey) -> Option<Instance> {
        self.cache.get(capability).map(|entry| Arc::clone(entry.value()))
    }
}

impl Resolver for Container {
    fn resolve_instance(&self, request: &Request) -> Result<Instance> {
        self.resolve_for(request, None)
    }

    fn implementation_of(&self, capability: &TypeKey) -> Option<TypeKey> {
        self.registry.binding(capability).map(|b| b.implementation)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

// ============================================================
// Resolution path
// ============================================================

/// One capability on the in-progress path; popped when dropped, so the
/// path is unwound on errors too.
struct ResolutionFrame<'a> {
    path: &'a RefCell<Vec<TypeKey>>,
}

impl<'a> ResolutionFrame<'a> {
    fn enter(path: &'a RefCell<Vec<TypeKey>>, capability: TypeKey) -> Result<Self> {
        let mut stack = path.borrow_mut();

        if let Some(start) = stack.iter().position(|k| *k == capability) {
            let mut chain = stack[start..].to_vec();
            chain.push(capability);

            let names: Vec<String> = chain.iter().map(TypeKey::short_name).collect();
            warn!(cycle = %render_path(&names), "Cyclic dependency while resolving");

            return Err(BinderyError::CyclicDependency(CyclicDependencyError { chain }));
        }

        stack.push(capability);
        Ok(Self { path })
    }
}

impl Drop for ResolutionFrame<'_> {
    fn drop(&mut self) {
        self.path.borrow_mut().pop();
    }
}

// ============================================================
// ComponentResolver (handed to factories)
// ============================================================

/// Resolver passed to a component factory; remembers which component is
/// being built so errors can name it.
struct ComponentResolver<'a> {
    container: &'a Container,
    component: TypeKey,
}

impl Resolver for ComponentResolver<'_> {
    fn resolve_instance(&self, request: &Request) -> Result<Instance> {
        self.container.resolve_for(request, Some(self.component))
    }

    fn implementation_of(&self, capability: &TypeKey) -> Option<TypeKey> {
        self.container.implementation_of(capability)
    }

    fn consumer(&self) -> Option<TypeKey> {
        Some(self.component)
    }
}

// ============================================================
// Prelude
// ============================================================

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::bind;
    pub use crate::component::{Component, Injectable, Slot};
    pub use crate::error::{BinderyError, Result};
    pub use crate::key::TypeKey;
    pub use crate::provider::{Provider, ProviderRegistration};
    pub use crate::registry::{Registrations, Request, Resolver};
}

// ============================================================
// Tests
// ============================================================
