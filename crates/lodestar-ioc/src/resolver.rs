//! Resolver facet: nearest-wins lookup along the parent chain
//!
//! Resolution starts in the container the resolver belongs to and walks up through its
//! ancestors; the first container holding the exact key wins. A registration in a child
//! therefore shadows the same key in any ancestor. Preclusion is only consulted in the
//! starting container, so a type precluded there cannot be resolved from it even when
//! an ancestor registers it.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use lodestar_common::format_error;

use crate::config::Configuration;
use crate::container::Container;
use crate::error::{IocError, IocResult};
use crate::key::RegistrationKey;
use crate::manager::Manager;
use crate::registrar::Registrar;
use crate::types::{ServiceType, TypeIdentifier};
use crate::value::{ErasedService, RegistrationValue};

/// Resolution view of a container
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    container: &'a Container,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn manager(&self) -> Manager<'a> {
        Manager::new(self.container)
    }

    pub fn registrar(&self) -> Registrar<'a> {
        Registrar::new(self.container)
    }

    pub fn configuration(&self) -> Configuration<'a> {
        Configuration::new(self.container)
    }

    /// Resolve the default registration of `T`
    pub fn resolve<T>(&self) -> IocResult<Arc<T>>
    where
        T: ?Sized + ServiceType,
    {
        self.resolve_named::<T>("")
    }

    /// Resolve the registration of `T` under `name`. Whitespace-only names select the
    /// default registration.
    pub fn resolve_named<T>(&self, name: &str) -> IocResult<Arc<T>>
    where
        T: ?Sized + ServiceType,
    {
        let key = RegistrationKey::of::<T>(name);
        let service = self.resolve_erased(&key)?;
        service
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| IocError::InvalidServiceType {
                service_type: key.service_type().to_string(),
                reason: "registered value does not produce this service type".to_string(),
            })
    }

    /// Like [`resolve`](Self::resolve) but returns `None` instead of failing
    pub fn try_resolve<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + ServiceType,
    {
        self.try_resolve_named::<T>("")
    }

    pub fn try_resolve_named<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + ServiceType,
    {
        match self.resolve_named::<T>(name) {
            Ok(service) => Some(service),
            Err(error) => {
                if !error.is_not_found() {
                    warn!(
                        container = %self.container,
                        service_type = std::any::type_name::<T>(),
                        error = %error,
                        "try_resolve swallowed a resolution failure"
                    );
                }
                None
            }
        }
    }

    /// Whether [`resolve`](Self::resolve) would find a registration, without
    /// constructing anything
    pub fn can_resolve<T>(&self) -> bool
    where
        T: ?Sized + ServiceType,
    {
        self.can_resolve_named::<T>("")
    }

    pub fn can_resolve_named<T>(&self, name: &str) -> bool
    where
        T: ?Sized + ServiceType,
    {
        self.find(&RegistrationKey::of::<T>(name)).is_ok()
    }

    /// Resolve `key` to its type-erased service, an `Arc<T>` boxed as `Any`
    pub fn resolve_erased(&self, key: &RegistrationKey) -> IocResult<ErasedService> {
        let (owner, value) = self.find(key)?;

        value.produce().map_err(|error| {
            let cause: &(dyn std::error::Error + 'static) = error.as_ref();
            let implementation = value
                .implementation_type()
                .map(|ty| ty.to_string())
                .unwrap_or_else(|| "instance".to_string());
            debug!(
                container = %owner,
                key = %key,
                implementation = %implementation,
                "Implementation construction failed"
            );
            IocError::ImplementationConstruction {
                service_type: key.service_type().to_string(),
                implementation,
                reason: format_error(cause),
            }
        })
    }

    fn find(&self, key: &RegistrationKey) -> IocResult<(Container, RegistrationValue)> {
        let service_type = key.service_type();
        if !service_type.is_abstract() {
            return Err(not_found(service_type, key));
        }
        self.container.ensure_live()?;

        let found = {
            let state = self.container.state().read();
            if state.precluded.contains(&service_type) {
                return Err(IocError::TypePrecluded {
                    container: self.container.to_string(),
                    service_type: service_type.to_string(),
                });
            }
            state.registrations.get(key).cloned()
        };
        if let Some(value) = found {
            return Ok((self.container.clone(), value));
        }

        let mut current = self.container.parent();
        while let Some(container) = current {
            let found = container.state().read().registrations.get(key).cloned();
            if let Some(value) = found {
                trace!(requested = %self.container, owner = %container, key = %key, "Resolved from ancestor");
                return Ok((container, value));
            }
            current = container.parent();
        }

        Err(not_found(service_type, key))
    }
}

fn not_found(service_type: TypeIdentifier, key: &RegistrationKey) -> IocError {
    IocError::Resolution {
        service_type: service_type.to_string(),
        name: key.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ServiceLifetime;

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    #[derive(Default)]
    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            42
        }
    }

    struct Broken;

    impl Default for Broken {
        fn default() -> Self {
            panic!("clock hardware missing")
        }
    }

    impl Clock for Broken {
        fn now(&self) -> u64 {
            0
        }
    }

    crate::service_contract!(dyn Clock);
    crate::concrete_service_type!(FixedClock);
    crate::implements!(FixedClock => dyn Clock);
    crate::implements!(Broken => dyn Clock);

    #[test]
    fn test_child_shadows_parent() {
        let root = Container::new("root");
        let child = root.create_child("child").unwrap();
        let parent_clock: Arc<dyn Clock> = Arc::new(FixedClock);
        let child_clock: Arc<dyn Clock> = Arc::new(FixedClock);
        root.registrar()
            .register_instance::<dyn Clock>(Arc::clone(&parent_clock))
            .unwrap();
        child
            .registrar()
            .register_instance::<dyn Clock>(Arc::clone(&child_clock))
            .unwrap();

        let resolved = child.resolver().resolve::<dyn Clock>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &child_clock));
        let resolved = root.resolver().resolve::<dyn Clock>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &parent_clock));
    }

    #[test]
    fn test_local_preclusion_hides_ancestor_registration() {
        let root = Container::new("root");
        let child = root.create_child("child").unwrap();
        root.registrar()
            .register_implementation::<dyn Clock, FixedClock>()
            .unwrap();
        child.registrar().add_precluded_type::<dyn Clock>().unwrap();

        assert!(matches!(
            child.resolver().resolve::<dyn Clock>(),
            Err(IocError::TypePrecluded { .. })
        ));
        assert!(child.resolver().try_resolve::<dyn Clock>().is_none());

        let grandchild = child.create_child("grandchild").unwrap();
        assert_eq!(grandchild.resolver().resolve::<dyn Clock>().unwrap().now(), 42);
    }

    #[test]
    fn test_concrete_type_is_not_resolvable() {
        let root = Container::new("root");
        assert!(matches!(
            root.resolver().resolve::<FixedClock>(),
            Err(IocError::Resolution { .. })
        ));
        assert!(root.resolver().try_resolve::<FixedClock>().is_none());
    }

    #[test]
    fn test_panicking_constructor_reports_construction_error() {
        let root = Container::new("root");
        root.registrar()
            .register_implementation_with::<dyn Clock, Broken>("", ServiceLifetime::Transient)
            .unwrap();

        match root.resolver().resolve::<dyn Clock>() {
            Err(IocError::ImplementationConstruction { reason, .. }) => {
                assert!(reason.contains("clock hardware missing"));
            }
            other => panic!("expected construction failure, got {:?}", other.map(|c| c.now())),
        }
        assert!(root.resolver().try_resolve::<dyn Clock>().is_none());
        assert!(root.resolver().can_resolve::<dyn Clock>());
    }

    #[test]
    fn test_disposed_container_cannot_resolve() {
        let root = Container::new("root");
        root.registrar()
            .register_implementation::<dyn Clock, FixedClock>()
            .unwrap();
        root.dispose();

        assert!(matches!(
            root.resolver().resolve::<dyn Clock>(),
            Err(IocError::ContainerDisposed { .. })
        ));
    }
}
