//! Registrar facet: the write side of a container
//!
//! Every mutation runs under the container's upgradable read lock: the preconditions
//! (lock flag, settings, preclusion, uniqueness) are checked first and the lock is only
//! upgraded for the insert or removal itself. Two threads registering the same key
//! therefore produce exactly one success and one
//! [`IocError::DuplicateRegistration`].
//!
//! Checks apply to this container only. Registrations and precluded types in
//! ancestors never cause a registration here to fail.

use parking_lot::RwLockUpgradableReadGuard;
use std::sync::Arc;
use tracing::debug;

use crate::config::Configuration;
use crate::container::Container;
use crate::error::{DisabledFeature, IocError, IocResult};
use crate::events::ContainerEvent;
use crate::key::RegistrationKey;
use crate::manager::Manager;
use crate::resolver::Resolver;
use crate::types::{Implements, ServiceType, TypeIdentifier};
use crate::value::{RegistrationValue, ServiceLifetime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collision {
    Fail,
    Skip,
}

/// Registration view of a container
#[derive(Clone, Copy)]
pub struct Registrar<'a> {
    container: &'a Container,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn manager(&self) -> Manager<'a> {
        Manager::new(self.container)
    }

    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.container)
    }

    pub fn configuration(&self) -> Configuration<'a> {
        Configuration::new(self.container)
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    /// Register the default instance for service type `T`
    pub fn register_instance<T>(&self, instance: Arc<T>) -> IocResult<()>
    where
        T: ?Sized + ServiceType,
    {
        self.register_named_instance::<T>("", instance)
    }

    pub fn register_named_instance<T>(&self, name: &str, instance: Arc<T>) -> IocResult<()>
    where
        T: ?Sized + ServiceType,
    {
        self.register_erased(RegistrationKey::of::<T>(name), RegistrationValue::instance(instance))
    }

    /// Like [`register_instance`](Self::register_instance), but an existing registration
    /// yields `Ok(false)` instead of an error
    pub fn try_register_instance<T>(&self, instance: Arc<T>) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
    {
        self.try_register_named_instance::<T>("", instance)
    }

    pub fn try_register_named_instance<T>(&self, name: &str, instance: Arc<T>) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
    {
        self.insert(
            RegistrationKey::of::<T>(name),
            RegistrationValue::instance(instance),
            Collision::Skip,
        )
    }

    // ------------------------------------------------------------------
    // Implementations
    // ------------------------------------------------------------------

    /// Register `U` as the default implementation of `T`, constructed on every
    /// resolution
    pub fn register_implementation<T, U>(&self) -> IocResult<()>
    where
        T: ?Sized + ServiceType,
        U: Implements<T> + Default,
    {
        self.register_implementation_with::<T, U>("", ServiceLifetime::Transient)
    }

    pub fn register_named_implementation<T, U>(&self, name: &str) -> IocResult<()>
    where
        T: ?Sized + ServiceType,
        U: Implements<T> + Default,
    {
        self.register_implementation_with::<T, U>(name, ServiceLifetime::Transient)
    }

    /// Register `U` as an implementation of `T` with an explicit lifetime
    pub fn register_implementation_with<T, U>(&self, name: &str, lifetime: ServiceLifetime) -> IocResult<()>
    where
        T: ?Sized + ServiceType,
        U: Implements<T> + Default,
    {
        self.register_erased(
            RegistrationKey::of::<T>(name),
            RegistrationValue::implementation::<T, U>(lifetime),
        )
    }

    pub fn try_register_implementation<T, U>(&self) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
        U: Implements<T> + Default,
    {
        self.try_register_named_implementation::<T, U>("")
    }

    pub fn try_register_named_implementation<T, U>(&self, name: &str) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
        U: Implements<T> + Default,
    {
        self.insert(
            RegistrationKey::of::<T>(name),
            RegistrationValue::implementation::<T, U>(ServiceLifetime::Transient),
            Collision::Skip,
        )
    }

    // ------------------------------------------------------------------
    // Type-erased registration
    // ------------------------------------------------------------------

    /// Register a prepared value under `key`.
    ///
    /// Used by reflection-driven callers that only hold a [`TypeIdentifier`]. The value
    /// must produce an `Arc<T>` for the key's service type `T`.
    pub fn register_erased(&self, key: RegistrationKey, value: RegistrationValue) -> IocResult<()> {
        self.insert(key, value, Collision::Fail).map(|_| ())
    }

    fn insert(&self, key: RegistrationKey, value: RegistrationValue, collision: Collision) -> IocResult<bool> {
        validate_service_type(&key.service_type())?;
        if let Some(implementation) = value.implementation_type() {
            if implementation.is_abstract() {
                return Err(IocError::InvalidImplementationType {
                    service_type: key.service_type().to_string(),
                    implementation: implementation.to_string(),
                    reason: "implementation types must be concrete".to_string(),
                });
            }
        }

        let description = value.describe();
        {
            let state = self.container.state().upgradable_read();
            if self.container.is_disposed() {
                return Err(self.container.disposed_error());
            }
            if state.locked {
                return Err(self.container.disabled(DisabledFeature::Locked));
            }
            if !key.is_default() && !state.settings.allow_named_implementations {
                return Err(self.container.disabled(DisabledFeature::NamedImplementations));
            }
            if state.precluded.contains(&key.service_type()) {
                return Err(IocError::TypePrecluded {
                    container: self.container.to_string(),
                    service_type: key.service_type().to_string(),
                });
            }
            if state.registrations.contains_key(&key) {
                return match collision {
                    Collision::Fail => Err(IocError::DuplicateRegistration {
                        container: self.container.to_string(),
                        key: key.to_string(),
                    }),
                    Collision::Skip => {
                        debug!(container = %self.container, key = %key, "Registration already present, skipped");
                        Ok(false)
                    }
                };
            }

            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            state.registrations.insert(key.clone(), value);
        }

        debug!(container = %self.container, key = %key, value = %description, "Registered service");
        self.container.notify(ContainerEvent::RegistrationAdded { key });
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove the default registration of `T` from this container.
    /// Returns `false` when there was none.
    pub fn unregister<T>(&self) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
    {
        self.unregister_named::<T>("")
    }

    pub fn unregister_named<T>(&self, name: &str) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
    {
        self.unregister_erased(&RegistrationKey::of::<T>(name))
    }

    pub fn unregister_erased(&self, key: &RegistrationKey) -> IocResult<bool> {
        {
            let state = self.container.state().upgradable_read();
            if self.container.is_disposed() {
                return Err(self.container.disposed_error());
            }
            if state.locked {
                return Err(self.container.disabled(DisabledFeature::Locked));
            }
            if !state.registrations.contains_key(key) {
                return Ok(false);
            }

            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            state.registrations.remove(key);
        }

        debug!(container = %self.container, key = %key, "Unregistered service");
        self.container
            .notify(ContainerEvent::RegistrationRemoved { key: key.clone() });
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Preclusion
    // ------------------------------------------------------------------

    /// Forbid registrations of `T` in this container.
    ///
    /// Returns `false` if `T` was already precluded. Fails if `T` currently has any
    /// registration here, or if the container's settings disallow preclusion.
    pub fn add_precluded_type<T>(&self) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
    {
        self.add_precluded_erased(TypeIdentifier::of::<T>())
    }

    pub fn add_precluded_erased(&self, service_type: TypeIdentifier) -> IocResult<bool> {
        validate_service_type(&service_type)?;
        {
            let state = self.container.state().upgradable_read();
            if self.container.is_disposed() {
                return Err(self.container.disposed_error());
            }
            if state.locked {
                return Err(self.container.disabled(DisabledFeature::Locked));
            }
            if !state.settings.allow_preclusion_of_types {
                return Err(self.container.disabled(DisabledFeature::Preclusion));
            }
            if state.registrations.contains_type(&service_type) {
                return Err(IocError::RegisteredTypeCannotBePrecluded {
                    container: self.container.to_string(),
                    service_type: service_type.to_string(),
                });
            }
            if state.precluded.contains(&service_type) {
                return Ok(false);
            }

            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            state.precluded.insert(service_type);
        }

        debug!(container = %self.container, service_type = %service_type, "Precluded type");
        self.container
            .notify(ContainerEvent::PrecludedTypeAdded { service_type });
        Ok(true)
    }

    /// Allow registrations of `T` again. Returns `false` if `T` was not precluded.
    pub fn remove_precluded_type<T>(&self) -> IocResult<bool>
    where
        T: ?Sized + ServiceType,
    {
        self.remove_precluded_erased(TypeIdentifier::of::<T>())
    }

    pub fn remove_precluded_erased(&self, service_type: TypeIdentifier) -> IocResult<bool> {
        {
            let state = self.container.state().upgradable_read();
            if self.container.is_disposed() {
                return Err(self.container.disposed_error());
            }
            if state.locked {
                return Err(self.container.disabled(DisabledFeature::Locked));
            }
            if !state.settings.allow_preclusion_of_types {
                return Err(self.container.disabled(DisabledFeature::Preclusion));
            }
            if !state.precluded.contains(&service_type) {
                return Ok(false);
            }

            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            state.precluded.remove(&service_type);
        }

        debug!(container = %self.container, service_type = %service_type, "Removed type preclusion");
        self.container
            .notify(ContainerEvent::PrecludedTypeRemoved { service_type });
        Ok(true)
    }

    pub fn is_precluded<T>(&self) -> bool
    where
        T: ?Sized + ServiceType,
    {
        self.container
            .state()
            .read()
            .precluded
            .contains(&TypeIdentifier::of::<T>())
    }

    // ------------------------------------------------------------------
    // Introspection and locking
    // ------------------------------------------------------------------

    /// Whether this container itself holds the default registration of `T`
    pub fn is_registered<T>(&self) -> bool
    where
        T: ?Sized + ServiceType,
    {
        self.is_registered_named::<T>("")
    }

    pub fn is_registered_named<T>(&self, name: &str) -> bool
    where
        T: ?Sized + ServiceType,
    {
        self.container
            .state()
            .read()
            .registrations
            .contains_key(&RegistrationKey::of::<T>(name))
    }

    /// See [`Configuration::lock`]
    pub fn lock_configuration(&self) {
        self.configuration().lock();
    }
}

fn validate_service_type(service_type: &TypeIdentifier) -> IocResult<()> {
    if service_type.is_abstract() {
        Ok(())
    } else {
        Err(IocError::InvalidServiceType {
            service_type: service_type.to_string(),
            reason: "service types must be abstract contracts such as trait objects".to_string(),
        })
    }
}
