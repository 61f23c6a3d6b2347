//! # Bindery: capability-to-component dependency injection for Rust
//!
//! Bind each capability (a trait) to one component (a struct), ask the
//! container for the capability, get back a fully wired singleton.
//!
//! ```rust
//! use std::sync::Arc;
//! use bindery::{Component, Container, bind};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! trait Welcome: Send + Sync {
//!     fn welcome(&self) -> String;
//! }
//!
//! #[derive(Component)]
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".into()
//!     }
//! }
//!
//! #[derive(Component)]
//! struct FrontDesk {
//!     #[inject]
//!     greeter: Arc<dyn Greeter>,
//! }
//!
//! impl Welcome for FrontDesk {
//!     fn welcome(&self) -> String {
//!         format!("{}, come in", self.greeter.greet())
//!     }
//! }
//!
//! let builder = bind!(Container::builder(), dyn Greeter => EnglishGreeter);
//! let container = bind!(builder, dyn Welcome => FrontDesk).build()?;
//!
//! let desk = container.resolve::<dyn Welcome>()?;
//! assert_eq!(desk.welcome(), "hello, come in");
//! # Ok::<(), bindery::BinderyError>(())
//! ```

pub use bindery_container::component::{Component, Injectable, Slot};
pub use bindery_container::error::{
    AlreadyBoundError, AlreadyRegisteredError, BinderyError, CyclicDependencyError, InjectionError,
    InvalidComponentError, InvalidReason, Result, UnboundCapabilityError,
};
pub use bindery_container::provider::{Provider, ProviderRegistration};
pub use bindery_container::registry::{Instance, Registrations, Request, Resolver};
pub use bindery_container::{Container, ContainerBuilder, TypeKey, bind, inventory, prelude};
pub use bindery_macros::Component;
pub use bindery_support::rendering;
