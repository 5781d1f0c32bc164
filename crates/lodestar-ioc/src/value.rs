//! Registration values
//!
//! A value is either a ready instance or a deferred constructor for an implementation
//! type. Both are stored type-erased as an [`ErasedService`], which always wraps an
//! `Arc<T>` for the registered service type `T`.

use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::{Implements, TypeIdentifier};

/// Type-erased service: an `Arc<T>` boxed as `Any`
pub type ErasedService = Arc<dyn Any + Send + Sync>;

type Constructor = Arc<dyn Fn() -> anyhow::Result<ErasedService> + Send + Sync>;

/// How often an implementation registration constructs its implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceLifetime {
    /// A new instance on every resolution
    #[default]
    Transient,
    /// One instance per registration, created on first resolution
    Singleton,
}

/// Value stored against a [`RegistrationKey`](crate::RegistrationKey)
#[derive(Clone)]
pub enum RegistrationValue {
    Instance {
        instance: ErasedService,
        instance_type: &'static str,
    },
    ImplementationFactory(ImplementationFactory),
}

/// Deferred construction of an implementation type
#[derive(Clone)]
pub struct ImplementationFactory {
    implementation: TypeIdentifier,
    lifetime: ServiceLifetime,
    constructor: Constructor,
    cache: Arc<OnceCell<ErasedService>>,
}

impl RegistrationValue {
    /// Wrap an existing instance of service type `T`
    pub fn instance<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Self {
        RegistrationValue::Instance {
            instance: Arc::new(instance),
            instance_type: std::any::type_name::<T>(),
        }
    }

    /// Defer construction of `U` through its parameterless constructor, exposed as `T`.
    ///
    /// A panic inside `U::default` is reported as a construction failure.
    pub fn implementation<T, U>(lifetime: ServiceLifetime) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        U: Implements<T> + Default,
    {
        Self::from_constructor(TypeIdentifier::concrete_of::<U>(), lifetime, || {
            let created = std::panic::catch_unwind(U::default).map_err(|payload| {
                anyhow::anyhow!("constructor panicked: {}", panic_message(payload.as_ref()))
            })?;
            let service: Arc<T> = <U as Implements<T>>::into_service(Arc::new(created));
            Ok(Arc::new(service) as ErasedService)
        })
    }

    /// Defer construction to an arbitrary constructor.
    ///
    /// The constructor must return an `Arc<T>` boxed as [`ErasedService`], where `T` is
    /// the service type of the key this value is registered under.
    pub fn from_constructor<F>(
        implementation: TypeIdentifier,
        lifetime: ServiceLifetime,
        constructor: F,
    ) -> Self
    where
        F: Fn() -> anyhow::Result<ErasedService> + Send + Sync + 'static,
    {
        RegistrationValue::ImplementationFactory(ImplementationFactory {
            implementation,
            lifetime,
            constructor: Arc::new(constructor),
            cache: Arc::new(OnceCell::new()),
        })
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, RegistrationValue::Instance { .. })
    }

    /// Implementation type of a deferred registration
    pub fn implementation_type(&self) -> Option<TypeIdentifier> {
        match self {
            RegistrationValue::Instance { .. } => None,
            RegistrationValue::ImplementationFactory(factory) => Some(factory.implementation),
        }
    }

    pub fn lifetime(&self) -> Option<ServiceLifetime> {
        match self {
            RegistrationValue::Instance { .. } => None,
            RegistrationValue::ImplementationFactory(factory) => Some(factory.lifetime),
        }
    }

    /// Human-readable description of what this value produces
    pub fn describe(&self) -> String {
        match self {
            RegistrationValue::Instance { instance_type, .. } => format!("instance of {}", instance_type),
            RegistrationValue::ImplementationFactory(factory) => {
                format!("{:?} {}", factory.lifetime, factory.implementation)
            }
        }
    }

    /// Produce the erased service, constructing it if needed
    pub(crate) fn produce(&self) -> anyhow::Result<ErasedService> {
        match self {
            RegistrationValue::Instance { instance, .. } => Ok(Arc::clone(instance)),
            RegistrationValue::ImplementationFactory(factory) => match factory.lifetime {
                ServiceLifetime::Transient => (factory.constructor)(),
                ServiceLifetime::Singleton => factory
                    .cache
                    .get_or_try_init(|| (factory.constructor)())
                    .map(Arc::clone),
            },
        }
    }
}

impl fmt::Debug for RegistrationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationValue::Instance { instance_type, .. } => f
                .debug_struct("Instance")
                .field("instance_type", instance_type)
                .finish(),
            RegistrationValue::ImplementationFactory(factory) => f
                .debug_struct("ImplementationFactory")
                .field("implementation", &factory.implementation)
                .field("lifetime", &factory.lifetime)
                .field("constructed", &factory.cache.get().is_some())
                .finish(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
