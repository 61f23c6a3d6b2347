//! Binding and component tables.
//!
//! The registry maps each capability to the implementation bound to it, and
//! each registered implementation to the factory that builds it. Both tables
//! are filled through [`Registrations`] and frozen when the container is
//! built.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bindery_support::rendering::{closest_matches, short_type_name};
use tracing::{debug, trace};

use crate::component::{Component, Slot};
use crate::error::{
    AlreadyBoundError, AlreadyRegisteredError, BinderyError, InjectionError,
    InvalidComponentError, InvalidReason, Result,
};
use crate::key::TypeKey;

/// A type-erased, fully wired instance.
///
/// The payload is always an `Arc<T>`; for cached capabilities `T` is the
/// capability type itself, so every consumer shares one allocation.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an implementation, resolving its slots through the [`Resolver`].
///
/// The returned [`Instance`] holds an `Arc<Implementation>`.
pub type ComponentFn = Arc<dyn Fn(&dyn Resolver) -> Result<Instance> + Send + Sync>;

/// Turns an `Arc<Implementation>` instance into an `Arc<Capability>` one.
///
/// Returns `None` when the instance is not of the expected implementation.
pub type UpcastFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// A typed request for one capability.
///
/// Carries the check that a built instance really is an `Arc<C>`, so the
/// container can reject a wrongly typed component before caching it.
#[derive(Clone, Copy)]
pub struct Request {
    capability: TypeKey,
    slot: Option<&'static str>,
    accepts: fn(&Instance) -> bool,
}

impl Request {
    /// Asks for capability `C` directly.
    pub fn capability<C: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            capability: TypeKey::of::<C>(),
            slot: None,
            accepts: holds::<C>,
        }
    }

    /// Asks for capability `C` on behalf of the slot named `slot`.
    pub fn slot<C: ?Sized + Send + Sync + 'static>(slot: &'static str) -> Self {
        Self {
            slot: Some(slot),
            ..Self::capability::<C>()
        }
    }

    pub fn key(&self) -> TypeKey {
        self.capability
    }

    pub fn slot_name(&self) -> Option<&'static str> {
        self.slot
    }

    /// Returns `true` if `instance` holds an `Arc` of the requested capability.
    pub fn accepts(&self, instance: &Instance) -> bool {
        (self.accepts)(instance)
    }

    /// The error for an instance this request does not accept.
    ///
    /// Slot requests fail with an injection error, direct requests with an
    /// invalid-component error.
    pub fn rejected(&self, implementation: TypeKey, consumer: Option<TypeKey>) -> BinderyError {
        match self.slot {
            Some(slot) => BinderyError::Injection(InjectionError {
                slot,
                capability: self.capability,
                component: consumer,
            }),
            None => BinderyError::InvalidComponent(InvalidComponentError {
                capability: self.capability,
                implementation,
                reason: InvalidReason::WrongType,
            }),
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("capability", &self.capability)
            .field("slot", &self.slot)
            .finish()
    }
}

fn holds<C: ?Sized + Send + Sync + 'static>(instance: &Instance) -> bool {
    (**instance).is::<Arc<C>>()
}

/// What component factories use to obtain their dependencies.
///
/// Separated from the container so factories never see its internals.
pub trait Resolver: Send + Sync {
    /// Resolves a request to its cached or freshly built instance.
    ///
    /// The returned instance is accepted by `request`.
    fn resolve_instance(&self, request: &Request) -> Result<Instance>;

    /// The implementation bound to `capability`, if any.
    fn implementation_of(&self, capability: &TypeKey) -> Option<TypeKey>;

    /// The component currently being built through this resolver.
    fn consumer(&self) -> Option<TypeKey> {
        None
    }
}

impl dyn Resolver + '_ {
    /// Resolves capability `C`.
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        self.fetch(&Request::capability::<C>())
    }

    /// Resolves capability `C` for the slot named `slot`.
    ///
    /// A resolved value that cannot be assigned to the slot is reported as
    /// an [`InjectionError`] naming the slot.
    pub fn inject<C: ?Sized + Send + Sync + 'static>(&self, slot: &'static str) -> Result<Arc<C>> {
        self.fetch(&Request::slot::<C>(slot))
    }

    fn fetch<C: ?Sized + Send + Sync + 'static>(&self, request: &Request) -> Result<Arc<C>> {
        let instance = self.resolve_instance(request)?;

        downcast::<C>(&instance).ok_or_else(|| {
            let capability = request.key();
            request.rejected(
                self.implementation_of(&capability).unwrap_or(capability),
                self.consumer(),
            )
        })
    }
}

pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<T>> {
    (**instance).downcast_ref::<Arc<T>>().cloned()
}

/// A registered implementation and the factory that builds it.
#[derive(Clone)]
pub(crate) struct ComponentEntry {
    pub implementation: TypeKey,
    pub slots: Vec<Slot>,
    pub factory: ComponentFn,
}

impl std::fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("implementation", &self.implementation)
            .field("slots", &self.slots)
            .finish()
    }
}

/// One row of the binding table.
#[derive(Clone)]
pub(crate) struct Binding {
    pub implementation: TypeKey,
    pub upcast: UpcastFn,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("implementation", &self.implementation)
            .finish()
    }
}

/// The frozen binding and component tables.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    bindings: HashMap<TypeKey, Binding>,
    components: HashMap<TypeKey, ComponentEntry>,
}

impl Registry {
    pub fn binding(&self, capability: &TypeKey) -> Option<&Binding> {
        self.bindings.get(capability)
    }

    pub fn component(&self, implementation: &TypeKey) -> Option<&ComponentEntry> {
        self.components.get(implementation)
    }

    /// Bound capabilities, sorted by type name.
    pub fn capabilities(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.bindings.keys().copied().collect();
        keys.sort_by_key(TypeKey::type_name);
        keys
    }

    /// Short names of bound capabilities that look like `capability`.
    pub fn suggestions(&self, capability: &TypeKey) -> Vec<String> {
        let names: Vec<&str> = self.bindings.keys().map(TypeKey::type_name).collect();
        closest_matches(capability.type_name(), &names, 3)
            .iter()
            .map(|name| short_type_name(name))
            .collect()
    }

    /// Number of bound capabilities.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Collects components and bindings before the container is built.
///
/// [`ContainerBuilder`](crate::container::ContainerBuilder) wraps this, and
/// [`Provider`](crate::provider::Provider)s receive it directly.
///
/// Registration never fails on the spot; problems such as a capability
/// bound twice are recorded and reported by `build()`.
#[derive(Debug, Default)]
pub struct Registrations {
    registry: Registry,
    allow_override: bool,
    errors: Vec<BinderyError>,
}

impl Registrations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_allow_override(&mut self, allow: bool) {
        self.allow_override = allow;
    }

    /// Registers `I` as a constructible component.
    ///
    /// Registering the same component twice is harmless; the first
    /// registration is kept.
    pub fn component<I: Component>(&mut self) -> &mut Self {
        let implementation = TypeKey::of::<I>();
        if self.registry.components.contains_key(&implementation) {
            trace!(implementation = %implementation, "Component already registered");
            return self;
        }

        let factory: ComponentFn = Arc::new(|resolver: &dyn Resolver| {
            I::construct(resolver).map(|component| Arc::new(Arc::new(component)) as Instance)
        });
        self.component_raw(implementation, I::slots(), factory)
    }

    /// Binds capability `C` to implementation `I`.
    ///
    /// `upcast` converts the built component into the capability, usually
    /// just `|component| component as Arc<dyn Capability>`. `I` must also be
    /// registered with [`component`](Self::component), otherwise resolving
    /// `C` fails with an invalid-component error.
    pub fn bind<C, I>(
        &mut self,
        upcast: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    ) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Send + Sync + 'static,
    {
        let erased: UpcastFn = Arc::new(move |instance: Instance| {
            let component = downcast::<I>(&instance)?;
            Some(Arc::new(upcast(component)) as Instance)
        });
        self.bind_raw(TypeKey::of::<C>(), TypeKey::of::<I>(), erased)
    }

    /// Registers component `I` and binds capability `C` to it.
    pub fn provide<C, I>(
        &mut self,
        upcast: impl Fn(Arc<I>) -> Arc<C> + Send + Sync + 'static,
    ) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Component,
    {
        self.component::<I>();
        self.bind::<C, I>(upcast)
    }

    /// Binds capability `C` directly to a factory closure.
    ///
    /// The factory acts as its own implementation; it declares no slots, so
    /// its dependencies are only checked when it runs.
    pub fn factory<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        factory: impl Fn(&dyn Resolver) -> Result<Arc<C>> + Send + Sync + 'static,
    ) -> &mut Self {
        let key = TypeKey::of::<C>();
        self.component_raw(
            key,
            Vec::new(),
            Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|instance| Arc::new(instance) as Instance)
            }),
        );
        self.bind_raw(key, key, Arc::new(|instance: Instance| Some(instance)))
    }

    /// Binds capability `C` to an already built instance.
    pub fn value<C: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<C>) -> &mut Self {
        self.factory::<C>(move |_| Ok(Arc::clone(&instance)))
    }

    /// Registers a type-erased component.
    ///
    /// Prefer [`component`](Self::component); the factory must return an
    /// instance holding an `Arc` of `implementation`. Replacing a registered
    /// component is an error unless overrides are allowed.
    pub fn component_raw(
        &mut self,
        implementation: TypeKey,
        slots: Vec<Slot>,
        factory: ComponentFn,
    ) -> &mut Self {
        if self.registry.components.contains_key(&implementation) {
            if !self.allow_override {
                self.errors.push(BinderyError::AlreadyRegistered(AlreadyRegisteredError {
                    implementation,
                }));
                return self;
            }
            debug!(implementation = %implementation, "Overriding component");
        }

        trace!(implementation = %implementation, slots = slots.len(), "Registered component");
        self.registry.components.insert(
            implementation,
            ComponentEntry { implementation, slots, factory },
        );
        self
    }

    /// Registers a type-erased binding.
    pub fn bind_raw(
        &mut self,
        capability: TypeKey,
        implementation: TypeKey,
        upcast: UpcastFn,
    ) -> &mut Self {
        if let Some(existing) = self.registry.bindings.get(&capability) {
            if !self.allow_override {
                self.errors.push(BinderyError::AlreadyBound(AlreadyBoundError {
                    capability,
                    existing: existing.implementation,
                    rejected: implementation,
                }));
                return self;
            }
            debug!(capability = %capability, previous = %existing.implementation, "Overriding binding");
        }

        debug!(capability = %capability, implementation = %implementation, "Bound capability");
        self.registry.bindings.insert(
            capability,
            Binding { implementation, upcast },
        );
        self
    }

    /// Number of bound capabilities so far.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub(crate) fn finish(self) -> (Registry, Vec<BinderyError>) {
        (self.registry, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Reader: Send + Sync {
        fn read(&self) -> &'static str;
    }

    struct ReaderImpl;

    impl Reader for ReaderImpl {
        fn read(&self) -> &'static str {
            "id,name"
        }
    }

    impl Component for ReaderImpl {
        fn construct(_: &dyn Resolver) -> Result<Self> {
            Ok(ReaderImpl)
        }
    }

    struct OtherReader;

    impl Reader for OtherReader {
        fn read(&self) -> &'static str {
            "other"
        }
    }

    impl Component for OtherReader {
        fn construct(_: &dyn Resolver) -> Result<Self> {
            Ok(OtherReader)
        }
    }

    #[test]
    fn provide_fills_both_tables() {
        let mut regs = Registrations::new();
        regs.provide::<dyn Reader, ReaderImpl>(|r| r as Arc<dyn Reader>);

        let (registry, errors) = regs.finish();
        assert!(errors.is_empty());

        let binding = registry.binding(&TypeKey::of::<dyn Reader>()).unwrap();
        assert_eq!(binding.implementation, TypeKey::of::<ReaderImpl>());
        assert!(registry.component(&TypeKey::of::<ReaderImpl>()).is_some());
    }

    #[test]
    fn bind_alone_does_not_register_component() {
        let mut regs = Registrations::new();
        regs.bind::<dyn Reader, ReaderImpl>(|r| r as Arc<dyn Reader>);

        let (registry, _) = regs.finish();
        assert!(registry.binding(&TypeKey::of::<dyn Reader>()).is_some());
        assert!(registry.component(&TypeKey::of::<ReaderImpl>()).is_none());
    }

    #[test]
    fn second_binding_is_rejected() {
        let mut regs = Registrations::new();
        regs.provide::<dyn Reader, ReaderImpl>(|r| r as Arc<dyn Reader>);
        regs.provide::<dyn Reader, OtherReader>(|r| r as Arc<dyn Reader>);

        let (registry, errors) = regs.finish();
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            BinderyError::AlreadyBound(err) => {
                assert_eq!(err.existing, TypeKey::of::<ReaderImpl>());
                assert_eq!(err.rejected, TypeKey::of::<OtherReader>());
            }
            other => panic!("Expected AlreadyBound, got: {other:?}"),
        }
        let binding = registry.binding(&TypeKey::of::<dyn Reader>()).unwrap();
        assert_eq!(binding.implementation, TypeKey::of::<ReaderImpl>());
    }

    #[test]
    fn override_replaces_binding() {
        let mut regs = Registrations::new();
        regs.set_allow_override(true);
        regs.provide::<dyn Reader, ReaderImpl>(|r| r as Arc<dyn Reader>);
        regs.provide::<dyn Reader, OtherReader>(|r| r as Arc<dyn Reader>);

        let (registry, errors) = regs.finish();
        assert!(errors.is_empty());
        let binding = registry.binding(&TypeKey::of::<dyn Reader>()).unwrap();
        assert_eq!(binding.implementation, TypeKey::of::<OtherReader>());
    }

    #[test]
    fn upcast_rejects_foreign_instance() {
        let mut regs = Registrations::new();
        regs.bind::<dyn Reader, ReaderImpl>(|r| r as Arc<dyn Reader>);
        let (registry, _) = regs.finish();

        let binding = registry.binding(&TypeKey::of::<dyn Reader>()).unwrap();
        let foreign: Instance = Arc::new(Arc::new(OtherReader));
        assert!((binding.upcast)(foreign).is_none());

        let own: Instance = Arc::new(Arc::new(ReaderImpl));
        let upcast = (binding.upcast)(own).unwrap();
        let reader = downcast::<dyn Reader>(&upcast).unwrap();
        assert_eq!(reader.read(), "id,name");
    }

    #[test]
    fn component_registered_twice_keeps_one_entry() {
        let mut regs = Registrations::new();
        regs.component::<ReaderImpl>();
        regs.component::<ReaderImpl>();

        let (registry, errors) = regs.finish();
        assert!(errors.is_empty());
        assert!(registry.component(&TypeKey::of::<ReaderImpl>()).is_some());
    }

    #[test]
    fn raw_component_cannot_replace_registered_one() {
        let mut regs = Registrations::new();
        regs.component::<ReaderImpl>();
        regs.factory::<ReaderImpl>(|_| Ok(Arc::new(ReaderImpl)));

        let (_, errors) = regs.finish();
        assert!(matches!(
            errors.first(),
            Some(BinderyError::AlreadyRegistered(e)) if e.implementation == TypeKey::of::<ReaderImpl>()
        ));
    }

    #[test]
    fn request_checks_instance_type() {
        let request = Request::capability::<dyn Reader>();
        let reader: Instance = Arc::new(Arc::new(ReaderImpl) as Arc<dyn Reader>);
        let concrete: Instance = Arc::new(Arc::new(ReaderImpl));

        assert!(request.accepts(&reader));
        assert!(!request.accepts(&concrete));
    }

    #[test]
    fn rejection_depends_on_slot() {
        let implementation = TypeKey::of::<ReaderImpl>();

        let direct = Request::capability::<dyn Reader>().rejected(implementation, None);
        assert!(matches!(
            direct,
            BinderyError::InvalidComponent(InvalidComponentError { reason: InvalidReason::WrongType, .. })
        ));

        let slot = Request::slot::<dyn Reader>("reader");
        assert_eq!(slot.slot_name(), Some("reader"));
        match slot.rejected(implementation, Some(TypeKey::of::<OtherReader>())) {
            BinderyError::Injection(e) => {
                assert_eq!(e.slot, "reader");
                assert_eq!(e.component, Some(TypeKey::of::<OtherReader>()));
            }
            other => panic!("Expected Injection, got: {other:?}"),
        }
    }

    #[test]
    fn suggestions_use_short_names() {
        trait ProductParser {}
        let mut regs = Registrations::new();
        regs.provide::<dyn Reader, ReaderImpl>(|r| r as Arc<dyn Reader>);
        let (registry, _) = regs.finish();

        assert_eq!(registry.suggestions(&TypeKey::of::<dyn Reader>()), Vec::<String>::new());
        assert!(registry.suggestions(&TypeKey::of::<dyn ProductParser>()).is_empty());
    }
}
