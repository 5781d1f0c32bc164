//! Static service location through the ambient container
//!
//! ```rust
//! use lodestar_ioc::{locator, service_contract};
//!
//! pub trait Greeter: Send + Sync {}
//! service_contract!(dyn Greeter);
//!
//! assert!(locator::try_resolve::<dyn Greeter>().is_none());
//! ```

use std::sync::Arc;

use crate::ambient::ambient_container;
use crate::container::Container;
use crate::error::{IocError, IocResult};
use crate::types::ServiceType;

/// The ambient container, or [`IocError::NoAmbientContainer`] once the root is gone
pub fn current_container() -> IocResult<Container> {
    ambient_container().ok_or(IocError::NoAmbientContainer)
}

pub fn resolve<T>() -> IocResult<Arc<T>>
where
    T: ?Sized + ServiceType,
{
    current_container()?.resolver().resolve::<T>()
}

pub fn resolve_named<T>(name: &str) -> IocResult<Arc<T>>
where
    T: ?Sized + ServiceType,
{
    current_container()?.resolver().resolve_named::<T>(name)
}

pub fn try_resolve<T>() -> Option<Arc<T>>
where
    T: ?Sized + ServiceType,
{
    ambient_container()?.resolver().try_resolve::<T>()
}

pub fn try_resolve_named<T>(name: &str) -> Option<Arc<T>>
where
    T: ?Sized + ServiceType,
{
    ambient_container()?.resolver().try_resolve_named::<T>(name)
}
