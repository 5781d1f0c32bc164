//! Type identity for the registry
//!
//! Rust has no runtime reflection, so the questions the registrar asks about a type are
//! answered by traits the type opts into:
//!
//! - "is this an abstract service contract?" - [`ServiceType::KIND`], normally declared
//!   for trait objects with [`service_contract!`](crate::service_contract)
//! - "is this implementation assignable to that contract?" - [`Implements`], declared
//!   with [`implements!`](crate::implements)
//! - "does this implementation have a parameterless constructor?" - `Default`
//!
//! [`TypeIdentifier`] is the type-erased identity stored in registration keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Whether a type may be used as a service contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Trait object or other abstract contract; may be registered and resolved
    Abstract,
    /// Concrete type; may only appear as an implementation
    Concrete,
}

/// A type that can appear as the "from" side of a registration.
///
/// Only [`TypeKind::Abstract`] types are accepted by the registrar and resolver.
/// A concrete type may still implement this trait (for example to be named in
/// reflection-driven code); using it as a service type fails at runtime with
/// [`IocError::InvalidServiceType`](crate::IocError::InvalidServiceType).
pub trait ServiceType: Send + Sync + 'static {
    const KIND: TypeKind;
}

/// Declares trait objects as abstract service contracts.
///
/// ```rust
/// use lodestar_ioc::service_contract;
///
/// pub trait Logger: Send + Sync {
///     fn log(&self, message: &str);
/// }
///
/// service_contract!(dyn Logger);
/// ```
#[macro_export]
macro_rules! service_contract {
    ($($contract:ty),+ $(,)?) => {
        $(
            impl $crate::ServiceType for $contract {
                const KIND: $crate::TypeKind = $crate::TypeKind::Abstract;
            }
        )+
    };
}

/// Declares concrete types as (non-resolvable) service types.
#[macro_export]
macro_rules! concrete_service_type {
    ($($concrete:ty),+ $(,)?) => {
        $(
            impl $crate::ServiceType for $concrete {
                const KIND: $crate::TypeKind = $crate::TypeKind::Concrete;
            }
        )+
    };
}

/// Assignability of an implementation to a service contract.
///
/// The single method performs the unsizing coercion `Arc<Self> -> Arc<T>` that generic
/// code cannot express on stable Rust.
pub trait Implements<T: ?Sized>: Send + Sync + 'static {
    fn into_service(self: Arc<Self>) -> Arc<T>;
}

/// Declares that an implementation type is assignable to one or more contracts.
///
/// ```rust
/// use lodestar_ioc::{implements, service_contract};
///
/// pub trait Logger: Send + Sync {
///     fn log(&self, message: &str);
/// }
/// service_contract!(dyn Logger);
///
/// #[derive(Default)]
/// pub struct ConsoleLogger;
///
/// impl Logger for ConsoleLogger {
///     fn log(&self, message: &str) {
///         println!("{message}");
///     }
/// }
///
/// implements!(ConsoleLogger => dyn Logger);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $implementation {
                fn into_service(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// Type-erased identity of a service or implementation type.
///
/// Equality and hashing use only the underlying `TypeId`.
#[derive(Clone, Copy)]
pub struct TypeIdentifier {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl TypeIdentifier {
    /// Identity of a declared service type
    pub fn of<T: ?Sized + ServiceType>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: T::KIND,
        }
    }

    /// Identity of an abstract type that has not been declared with [`ServiceType`]
    pub fn abstract_of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Abstract,
        }
    }

    /// Identity of a concrete type
    pub fn concrete_of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Concrete,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Abstract
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentifier {}

impl Hash for TypeIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeIdentifier")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
