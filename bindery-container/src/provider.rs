//! Provider trait: a module of related bindings.
//!
//! Providers group the bindings of one area of an application so the
//! bootstrap code does not grow into one long registration block.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use bindery_container::prelude::*;
//!
//! trait FileReader: Send + Sync {}
//! struct LocalFileReader;
//! impl FileReader for LocalFileReader {}
//!
//! struct StorageProvider;
//!
//! impl Provider for StorageProvider {
//!     fn register(&self, registrations: &mut Registrations) {
//!         registrations.factory::<dyn FileReader>(|_| {
//!             Ok(Arc::new(LocalFileReader) as Arc<dyn FileReader>)
//!         });
//!     }
//! }
//!
//! let container = Container::builder()
//!     .add_provider(&StorageProvider)
//!     .build()
//!     .expect("container builds");
//! assert!(container.contains::<dyn FileReader>());
//! ```
//!
//! Providers can also announce themselves at link time and be picked up with
//! [`ContainerBuilder::discover_providers`](crate::container::ContainerBuilder::discover_providers):
//!
//! ```rust,ignore
//! inventory::submit! { ProviderRegistration::new(&StorageProvider) }
//! ```

use crate::registry::Registrations;

/// A module that registers related components and bindings.
pub trait Provider: Send + Sync {
    /// Register components and bindings.
    ///
    /// Called once while the container is being built.
    fn register(&self, registrations: &mut Registrations);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A provider submitted for link-time discovery.
pub struct ProviderRegistration {
    provider: &'static dyn Provider,
}

impl ProviderRegistration {
    pub const fn new(provider: &'static dyn Provider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &'static dyn Provider {
        self.provider
    }
}

inventory::collect!(ProviderRegistration);

/// All providers submitted with `inventory::submit!`, ordered by name.
pub(crate) fn discovered() -> Vec<&'static dyn Provider> {
    let mut providers: Vec<&'static dyn Provider> = Vec::new();
    for registration in inventory::iter::<ProviderRegistration> {
        providers.push(registration.provider());
    }
    providers.sort_by(|a, b| a.name().cmp(b.name()));
    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TypeKey;
    use std::sync::Arc;

    trait Parser: Send + Sync {}
    struct CsvParser;
    impl Parser for CsvParser {}

    struct ParsingProvider;

    impl Provider for ParsingProvider {
        fn register(&self, registrations: &mut Registrations) {
            registrations.value::<dyn Parser>(Arc::new(CsvParser));
        }
    }

    #[test]
    fn provider_registers_bindings() {
        let mut registrations = Registrations::new();
        ParsingProvider.register(&mut registrations);
        assert_eq!(registrations.len(), 1);

        let (registry, errors) = registrations.finish();
        assert!(errors.is_empty());
        assert!(registry.binding(&TypeKey::of::<dyn Parser>()).is_some());
    }

    #[test]
    fn provider_has_name() {
        assert!(ParsingProvider.name().contains("ParsingProvider"));
    }

    #[test]
    fn registration_exposes_provider() {
        static REGISTRATION: ProviderRegistration = ProviderRegistration::new(&ParsingProvider);
        assert!(REGISTRATION.provider().name().contains("ParsingProvider"));
    }
}
