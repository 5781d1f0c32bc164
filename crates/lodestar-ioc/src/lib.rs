//! Hierarchical service-location registry
//!
//! Containers form a tree. Each container holds its own registrations, keyed by an
//! abstract service type plus an optional name, and resolution walks from a container up
//! through its ancestors until the first match ("nearest wins"). Containers can preclude
//! service types, restrict named registrations and lock their configuration. A
//! process-wide ambient container pointer backs static service location and can be
//! swapped for an isolated child in tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use lodestar_ioc::{implements, service_contract, Container};
//!
//! pub trait Logger: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//! service_contract!(dyn Logger);
//!
//! #[derive(Default)]
//! pub struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn name(&self) -> &'static str { "console" }
//! }
//! implements!(ConsoleLogger => dyn Logger);
//!
//! #[derive(Default)]
//! pub struct MockLogger;
//! impl Logger for MockLogger {
//!     fn name(&self) -> &'static str { "mock" }
//! }
//! implements!(MockLogger => dyn Logger);
//!
//! let root = Container::new("app");
//! root.registrar().register_implementation::<dyn Logger, ConsoleLogger>().unwrap();
//!
//! let child = root.manager().create_child_container("test").unwrap();
//! child.registrar().register_named_implementation::<dyn Logger, MockLogger>("test").unwrap();
//!
//! assert_eq!(child.resolver().resolve::<dyn Logger>().unwrap().name(), "console");
//! assert_eq!(child.resolver().resolve_named::<dyn Logger>("test").unwrap().name(), "mock");
//! ```
//!
//! ## Modules
//!
//! - [`container`]: container nodes, ownership and disposal
//! - [`registrar`], [`resolver`], [`config`], [`manager`]: facets over a container
//! - [`ambient`] and [`locator`]: the process root and the ambient container
//! - [`module`] and [`discovery`]: bulk and link-time registration

pub mod ambient;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod events;
pub mod key;
pub mod locator;
pub mod manager;
pub mod module;
pub mod registrar;
pub mod repository;
pub mod resolver;
pub mod types;
pub mod value;

pub use ambient::{
    ambient_container, ambient_manager, isolate, root_container, set_ambient_container,
    AmbientContainerChanged, AmbientContainerManager, AmbientContainerScope,
};
pub use config::{Configuration, ContainerSettings};
pub use container::Container;
pub use discovery::{apply_self_registrations, list_self_registrations, self_registration_count, SelfRegistration};
pub use error::{DisabledFeature, IocError, IocResult};
pub use events::{ContainerEvent, ContainerNotification};
pub use key::RegistrationKey;
pub use manager::Manager;
pub use module::{RegistrationModule, RegistrationModuleSet};
pub use registrar::Registrar;
pub use repository::RegistrationRepository;
pub use resolver::Resolver;
pub use types::{Implements, ServiceType, TypeIdentifier, TypeKind};
pub use value::{ErasedService, ImplementationFactory, RegistrationValue, ServiceLifetime};

pub use lodestar_common::SubscriptionId;

/// Re-exported so `inventory::submit!` works for crates that only depend on this one
pub use inventory;
