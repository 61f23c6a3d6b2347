//! Dependency graph validation.
//!
//! Walks the declared slots of every bound component when the container is
//! built, before the first `resolve()`:
//! - every bound implementation is a registered component
//! - every declared slot points at a bound capability
//! - no capability depends on itself
//!
//! Factories registered as closures declare no slots, so their dependencies
//! are only checked at resolve time.

use std::collections::HashSet;

use bindery_support::rendering::render_path;
use tracing::{debug, instrument, warn};

use crate::error::{
    BinderyError, CyclicDependencyError, InvalidComponentError, InvalidReason,
    UnboundCapabilityError,
};
use crate::key::TypeKey;
use crate::registry::Registry;

/// Depth-first validator over the capability graph.
///
/// Nodes are capabilities; edges run from a capability to the capabilities
/// of its bound component's slots. `visiting` holds the current DFS path so a
/// back edge is reported as a cycle with the full chain.
pub(crate) struct GraphValidator<'a> {
    registry: &'a Registry,
    visiting: HashSet<TypeKey>,
    validated: HashSet<TypeKey>,
    path: Vec<TypeKey>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates every bound capability.
    ///
    /// # Errors
    /// - [`BinderyError::InvalidComponent`]: bound implementation not registered
    /// - [`BinderyError::Unbound`]: a slot needs an unbound capability
    /// - [`BinderyError::CyclicDependency`]: cycle among declared slots
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<(), BinderyError> {
        let capabilities = self.registry.capabilities();
        debug!(capabilities = capabilities.len(), "Validating dependency graph");

        for capability in capabilities {
            self.visit(capability, None)?;
        }

        debug!("Dependency graph is valid");
        Ok(())
    }

    fn visit(&mut self, capability: TypeKey, required_by: Option<TypeKey>) -> Result<(), BinderyError> {
        if self.validated.contains(&capability) {
            return Ok(());
        }

        if self.visiting.contains(&capability) {
            let start = self.path.iter().position(|k| *k == capability).unwrap_or(0);
            let mut chain = self.path[start..].to_vec();
            chain.push(capability);

            let names: Vec<String> = chain.iter().map(TypeKey::short_name).collect();
            warn!(cycle = %render_path(&names), "Cyclic dependency in bindings");

            return Err(BinderyError::CyclicDependency(CyclicDependencyError { chain }));
        }

        let registry = self.registry;
        let binding = registry.binding(&capability).ok_or_else(|| {
            BinderyError::Unbound(UnboundCapabilityError {
                capability,
                required_by,
                suggestions: registry.suggestions(&capability),
            })
        })?;

        let component = registry.component(&binding.implementation).ok_or_else(|| {
            BinderyError::InvalidComponent(InvalidComponentError {
                capability,
                implementation: binding.implementation,
                reason: InvalidReason::NotAComponent,
            })
        })?;

        self.visiting.insert(capability);
        self.path.push(capability);

        for slot in &component.slots {
            self.visit(slot.capability(), Some(component.implementation))?;
        }

        self.path.pop();
        self.visiting.remove(&capability);
        self.validated.insert(capability);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Slot;
    use crate::registry::{Instance, Registrations, Resolver};
    use std::sync::Arc;

    trait A: Send + Sync {}
    trait B: Send + Sync {}
    trait C: Send + Sync {}
    trait D: Send + Sync {}

    struct AImpl;
    struct BImpl;
    struct CImpl;
    struct DImpl;

    /// Registers `implementation` for `capability` with the given slots.
    /// The factory is never run by the validator.
    fn declare(regs: &mut Registrations, capability: TypeKey, implementation: TypeKey, slots: Vec<Slot>) {
        regs.component_raw(
            implementation,
            slots,
            Arc::new(|_: &dyn Resolver| -> Result<Instance, BinderyError> { Ok(Arc::new(())) }),
        );
        regs.bind_raw(capability, implementation, Arc::new(|instance: Instance| Some(instance)));
    }

    fn validate(regs: Registrations) -> Result<(), BinderyError> {
        let (registry, _) = regs.finish();
        GraphValidator::new(&registry).validate()
    }

    #[test]
    fn valid_chain() {
        let mut regs = Registrations::new();
        declare(&mut regs, TypeKey::of::<dyn A>(), TypeKey::of::<AImpl>(), vec![Slot::new::<dyn B>("b")]);
        declare(&mut regs, TypeKey::of::<dyn B>(), TypeKey::of::<BImpl>(), vec![Slot::new::<dyn C>("c")]);
        declare(&mut regs, TypeKey::of::<dyn C>(), TypeKey::of::<CImpl>(), vec![]);

        assert!(validate(regs).is_ok());
    }

    #[test]
    fn detects_cycle_with_chain() {
        let mut regs = Registrations::new();
        declare(&mut regs, TypeKey::of::<dyn A>(), TypeKey::of::<AImpl>(), vec![Slot::new::<dyn B>("b")]);
        declare(&mut regs, TypeKey::of::<dyn B>(), TypeKey::of::<BImpl>(), vec![Slot::new::<dyn C>("c")]);
        declare(&mut regs, TypeKey::of::<dyn C>(), TypeKey::of::<CImpl>(), vec![Slot::new::<dyn A>("a")]);

        match validate(regs).unwrap_err() {
            BinderyError::CyclicDependency(err) => {
                assert_eq!(err.chain.len(), 4);
                assert_eq!(err.chain.first(), err.chain.last());
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn detects_self_dependency() {
        let mut regs = Registrations::new();
        declare(&mut regs, TypeKey::of::<dyn A>(), TypeKey::of::<AImpl>(), vec![Slot::new::<dyn A>("me")]);

        assert!(matches!(validate(regs), Err(BinderyError::CyclicDependency(_))));
    }

    #[test]
    fn detects_unbound_slot() {
        let mut regs = Registrations::new();
        declare(&mut regs, TypeKey::of::<dyn A>(), TypeKey::of::<AImpl>(), vec![Slot::new::<dyn B>("b")]);

        match validate(regs).unwrap_err() {
            BinderyError::Unbound(err) => {
                assert_eq!(err.capability, TypeKey::of::<dyn B>());
                assert_eq!(err.required_by, Some(TypeKey::of::<AImpl>()));
            }
            other => panic!("Expected Unbound, got: {other:?}"),
        }
    }

    #[test]
    fn detects_unregistered_component() {
        let mut regs = Registrations::new();
        regs.bind_raw(
            TypeKey::of::<dyn A>(),
            TypeKey::of::<AImpl>(),
            Arc::new(|instance: Instance| Some(instance)),
        );

        match validate(regs).unwrap_err() {
            BinderyError::InvalidComponent(err) => {
                assert_eq!(err.implementation, TypeKey::of::<AImpl>());
                assert_eq!(err.reason, InvalidReason::NotAComponent);
            }
            other => panic!("Expected InvalidComponent, got: {other:?}"),
        }
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        let mut regs = Registrations::new();
        declare(
            &mut regs,
            TypeKey::of::<dyn A>(),
            TypeKey::of::<AImpl>(),
            vec![Slot::new::<dyn B>("b"), Slot::new::<dyn C>("c")],
        );
        declare(&mut regs, TypeKey::of::<dyn B>(), TypeKey::of::<BImpl>(), vec![Slot::new::<dyn D>("d")]);
        declare(&mut regs, TypeKey::of::<dyn C>(), TypeKey::of::<CImpl>(), vec![Slot::new::<dyn D>("d")]);
        declare(&mut regs, TypeKey::of::<dyn D>(), TypeKey::of::<DImpl>(), vec![]);

        assert!(validate(regs).is_ok());
    }
}
