//! Error types for bindery container operations.
//!
//! Every error names the concrete capability, component or slot that
//! failed, so the caller sees the deepest cause of a failed resolution
//! rather than a generic "resolution failed".

use std::fmt;

use bindery_support::rendering::render_path;

use crate::key::TypeKey;

/// Main error type for all bindery operations.
#[derive(Debug, thiserror::Error)]
pub enum BinderyError {
    /// Requested capability has no binding.
    #[error("{}", .0)]
    Unbound(UnboundCapabilityError),

    /// The bound implementation is not a usable component.
    #[error("{}", .0)]
    InvalidComponent(InvalidComponentError),

    /// A component factory reported a failure.
    #[error("Failed to instantiate {implementation}: {source}")]
    Instantiation {
        implementation: TypeKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A resolved dependency could not be assigned to its slot.
    #[error("{}", .0)]
    Injection(InjectionError),

    /// Resolution re-entered a capability that is still being built.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// A second binding was registered for the same capability.
    #[error("{}", .0)]
    AlreadyBound(AlreadyBoundError),

    /// A second factory was registered for the same implementation.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),
}

impl BinderyError {
    /// Wraps a construction failure of implementation `I`.
    ///
    /// Component factories use this when their own setup fails:
    ///
    /// ```
    /// use bindery_container::error::BinderyError;
    ///
    /// struct Settings;
    ///
    /// let io = std::io::Error::other("settings file missing");
    /// let err = BinderyError::instantiation::<Settings>(io);
    /// assert!(err.to_string().contains("Settings"));
    /// ```
    pub fn instantiation<I: ?Sized + 'static>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Instantiation {
            implementation: TypeKey::of::<I>(),
            source: source.into(),
        }
    }
}

/// No binding exists for the requested capability.
#[derive(Debug)]
pub struct UnboundCapabilityError {
    /// The capability that was requested
    pub capability: TypeKey,
    /// The component whose slot asked for it, if any
    pub required_by: Option<TypeKey>,
    /// Bound capabilities with similar names
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnboundCapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No implementation bound for capability: {}", self.capability)?;

        if let Some(ref consumer) = self.required_by {
            write!(f, "\n  Required by: {consumer}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: bind it with bind!(builder, {} => YourComponent)",
            self.capability
        )
    }
}

/// Why a bound implementation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The implementation was never registered as a component.
    NotAComponent,
    /// The component produced a value that is not the capability.
    WrongType,
}

/// The implementation bound to a capability cannot serve it.
#[derive(Debug)]
pub struct InvalidComponentError {
    pub capability: TypeKey,
    pub implementation: TypeKey,
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            InvalidReason::NotAComponent => {
                write!(
                    f,
                    "Invalid component: {} (bound to {}) is not a registered component",
                    self.implementation, self.capability,
                )?;
                write!(
                    f,
                    "\n  Hint: register it with .component::<{}>()",
                    self.implementation
                )
            }
            InvalidReason::WrongType => write!(
                f,
                "Invalid component: {} does not produce an instance of {}",
                self.implementation, self.capability,
            ),
        }
    }
}

/// A resolved dependency could not be assigned to the slot that asked for it.
#[derive(Debug)]
pub struct InjectionError {
    /// Field name of the slot
    pub slot: &'static str,
    /// Capability the slot is typed as
    pub capability: TypeKey,
    /// Component owning the slot, if known
    pub component: Option<TypeKey>,
}

impl fmt::Display for InjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot inject slot `{}`", self.slot)?;
        if let Some(ref component) = self.component {
            write!(f, " of {component}")?;
        }
        write!(
            f,
            ": resolved value is not an instance of {}",
            self.capability
        )
    }
}

/// A capability depends on itself, directly or transitively.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// The capabilities forming the cycle, first and last equal.
    /// Example: `[A, B, A]`
    pub chain: Vec<TypeKey>,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(TypeKey::short_name).collect();
        write!(f, "Cyclic dependency detected:\n  {}", render_path(&names))?;
        write!(
            f,
            "\n  Hint: break the cycle by moving shared behavior into a third capability"
        )
    }
}

/// A capability was bound twice.
#[derive(Debug)]
pub struct AlreadyBoundError {
    pub capability: TypeKey,
    pub existing: TypeKey,
    pub rejected: TypeKey,
}

impl fmt::Display for AlreadyBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capability already bound: {} → {} (rejected {})",
            self.capability, self.existing, self.rejected,
        )?;
        write!(
            f,
            "\n  Hint: one capability takes exactly one implementation; use .allow_override(true) to replace it"
        )
    }
}

/// An implementation was registered as a component twice.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub implementation: TypeKey,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component already registered: {}", self.implementation)?;
        write!(
            f,
            "\n  Hint: use .allow_override(true) to replace its factory"
        )
    }
}

/// Convenient Result type for bindery operations.
pub type Result<T> = std::result::Result<T, BinderyError>;

#[cfg(test)]
mod tests {
    use super::*;

    trait ReaderCapability {}
    struct ReaderImpl;
    struct ParserImpl;

    #[test]
    fn unbound_display_names_capability_and_consumer() {
        let err = BinderyError::Unbound(UnboundCapabilityError {
            capability: TypeKey::of::<dyn ReaderCapability>(),
            required_by: Some(TypeKey::of::<ParserImpl>()),
            suggestions: vec!["ReaderCapabilty".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("dyn ReaderCapability"));
        assert!(msg.contains("Required by: ParserImpl"));
        assert!(msg.contains("Did you mean"));
    }

    #[test]
    fn invalid_component_display() {
        let err = BinderyError::InvalidComponent(InvalidComponentError {
            capability: TypeKey::of::<dyn ReaderCapability>(),
            implementation: TypeKey::of::<ReaderImpl>(),
            reason: InvalidReason::NotAComponent,
        });

        let msg = err.to_string();
        assert!(msg.contains("ReaderImpl"));
        assert!(msg.contains("not a registered component"));
    }

    #[test]
    fn instantiation_keeps_source() {
        use std::error::Error as _;

        let err = BinderyError::instantiation::<ReaderImpl>("disk on fire");
        assert!(err.to_string().contains("ReaderImpl"));
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk on fire"));
    }

    #[test]
    fn injection_display_names_slot() {
        let err = BinderyError::Injection(InjectionError {
            slot: "reader",
            capability: TypeKey::of::<dyn ReaderCapability>(),
            component: Some(TypeKey::of::<ParserImpl>()),
        });

        let msg = err.to_string();
        assert!(msg.contains("`reader`"));
        assert!(msg.contains("ParserImpl"));
    }

    #[test]
    fn cycle_display_renders_chain() {
        let err = BinderyError::CyclicDependency(CyclicDependencyError {
            chain: vec![
                TypeKey::of::<ReaderImpl>(),
                TypeKey::of::<ParserImpl>(),
                TypeKey::of::<ReaderImpl>(),
            ],
        });

        let msg = err.to_string();
        assert!(msg.contains("ReaderImpl → ParserImpl → ReaderImpl"));
    }
}
