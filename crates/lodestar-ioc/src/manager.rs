//! Manager facet: identity, tree navigation and child creation

use lodestar_common::listeners::SubscriptionId;
use uuid::Uuid;

use crate::config::Configuration;
use crate::container::Container;
use crate::error::IocResult;
use crate::events::ContainerNotification;
use crate::registrar::Registrar;
use crate::resolver::Resolver;

/// Tree-management view of a container
#[derive(Clone, Copy)]
pub struct Manager<'a> {
    container: &'a Container,
}

impl<'a> Manager<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn registrar(&self) -> Registrar<'a> {
        Registrar::new(self.container)
    }

    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.container)
    }

    pub fn configuration(&self) -> Configuration<'a> {
        Configuration::new(self.container)
    }

    pub fn uid(&self) -> Uuid {
        self.container.uid()
    }

    pub fn name(&self) -> &'a str {
        self.container.name()
    }

    pub fn parent(&self) -> Option<Container> {
        self.container.parent()
    }

    pub fn children(&self) -> Vec<Container> {
        self.container.children()
    }

    pub fn is_root(&self) -> bool {
        self.container.is_root()
    }

    pub fn is_disposed(&self) -> bool {
        self.container.is_disposed()
    }

    /// Create a child container owned by this one.
    ///
    /// The name is trimmed and may be empty. The child starts with a copy of this
    /// container's settings, unlocked. Fails only if this container is disposed.
    pub fn create_child_container(&self, name: &str) -> IocResult<Container> {
        self.container.create_child(name)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ContainerNotification) + Send + Sync + 'static,
    {
        self.container.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.container.unsubscribe(subscription)
    }

    /// See [`Container::dispose`]
    pub fn dispose(&self) {
        self.container.dispose();
    }
}
