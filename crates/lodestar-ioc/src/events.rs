//! Container notifications
//!
//! Delivered synchronously, after the container's lock has been released, to listeners
//! registered with [`Container::subscribe`].

use crate::config::ContainerSettings;
use crate::container::Container;
use crate::key::RegistrationKey;
use crate::types::TypeIdentifier;

#[derive(Debug, Clone)]
pub enum ContainerEvent {
    RegistrationAdded { key: RegistrationKey },
    RegistrationRemoved { key: RegistrationKey },
    ChildAdded { child: Container },
    ChildRemoved { child: Container },
    PrecludedTypeAdded { service_type: TypeIdentifier },
    PrecludedTypeRemoved { service_type: TypeIdentifier },
    ConfigurationChanged { settings: ContainerSettings, locked: bool },
    /// Fired once, before a container tears down its children and registrations
    Disposing,
}

/// An event together with the container that raised it
#[derive(Debug, Clone)]
pub struct ContainerNotification {
    pub source: Container,
    pub event: ContainerEvent,
}
