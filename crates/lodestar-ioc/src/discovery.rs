//! Link-time self-registration
//!
//! Any crate linked into the process can contribute registrations to the root
//! container with `inventory::submit!`. They are applied, in priority order, when the
//! root container is first created.
//!
//! ```rust,ignore
//! use lodestar_ioc::{IocResult, Registrar, SelfRegistration};
//!
//! fn register_storage(registrar: &Registrar<'_>) -> IocResult<()> {
//!     registrar.register_implementation::<dyn Storage, DiskStorage>()
//! }
//!
//! inventory::submit! {
//!     SelfRegistration::new("storage", register_storage)
//! }
//! ```

use tracing::{debug, info};

use crate::container::Container;
use crate::error::IocResult;
use crate::registrar::Registrar;

/// A registration function collected via `inventory`
pub struct SelfRegistration {
    /// Name of the contributing feature, for diagnostics
    pub name: &'static str,

    pub register_fn: fn(&Registrar<'_>) -> IocResult<()>,

    /// Lower values run first (default 100)
    pub priority: u32,
}

impl SelfRegistration {
    pub const fn new(name: &'static str, register_fn: fn(&Registrar<'_>) -> IocResult<()>) -> Self {
        Self {
            name,
            register_fn,
            priority: 100,
        }
    }

    pub const fn with_priority(
        name: &'static str,
        register_fn: fn(&Registrar<'_>) -> IocResult<()>,
        priority: u32,
    ) -> Self {
        Self {
            name,
            register_fn,
            priority,
        }
    }
}

inventory::collect!(SelfRegistration);

/// Run every submitted [`SelfRegistration`] against `container`.
///
/// Stops at the first failure. Returns the number of registrations applied.
pub fn apply_self_registrations(container: &Container) -> IocResult<usize> {
    let mut registrations: Vec<&SelfRegistration> = inventory::iter::<SelfRegistration>().collect();
    // Stable sort keeps link order between equal priorities
    registrations.sort_by_key(|r| r.priority);

    info!(
        container = %container,
        discovered = registrations.len(),
        "Applying self-registrations"
    );

    let registrar = container.registrar();
    for registration in &registrations {
        debug!(name = registration.name, priority = registration.priority, "Applying self-registration");
        (registration.register_fn)(&registrar)?;
    }

    Ok(registrations.len())
}

pub fn self_registration_count() -> usize {
    inventory::iter::<SelfRegistration>().count()
}

pub fn list_self_registrations() -> Vec<&'static str> {
    inventory::iter::<SelfRegistration>().map(|r| r.name).collect()
}
