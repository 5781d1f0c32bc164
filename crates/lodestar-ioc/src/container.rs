//! Container nodes
//!
//! A [`Container`] is a cheap, clonable handle to one node of the container tree.
//! Parents own their children; a child only keeps a weak back-reference to its parent
//! for chain-walk lookups. Dropping the last handle to a container that was never
//! disposed disposes its remaining children, so a child never outlives its parent
//! while still answering lookups. All registry state of a node sits behind a single
//! `parking_lot::RwLock` so registrar check-then-act sequences see a consistent view of
//! registrations, precluded types and settings together.

use lodestar_common::listeners::{ListenerSet, SubscriptionId};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;
use uuid::Uuid;

use crate::config::{Configuration, ContainerSettings};
use crate::error::{DisabledFeature, IocError, IocResult};
use crate::events::{ContainerEvent, ContainerNotification};
use crate::key::normalize_name;
use crate::manager::Manager;
use crate::registrar::Registrar;
use crate::repository::RegistrationRepository;
use crate::resolver::Resolver;
use crate::types::TypeIdentifier;

/// Mutable registry state of one container
#[derive(Debug, Default)]
pub(crate) struct ContainerState {
    pub(crate) registrations: RegistrationRepository,
    pub(crate) precluded: HashSet<TypeIdentifier>,
    pub(crate) settings: ContainerSettings,
    pub(crate) locked: bool,
}

pub(crate) struct ContainerInner {
    uid: Uuid,
    name: String,
    parent: Option<Weak<ContainerInner>>,
    children: RwLock<Vec<Container>>,
    state: RwLock<ContainerState>,
    disposed: AtomicBool,
    listeners: ListenerSet<ContainerNotification>,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if *self.disposed.get_mut() {
            return;
        }
        let children = std::mem::take(self.children.get_mut());
        if children.is_empty() {
            return;
        }
        debug!(
            uid = %self.uid,
            name = %self.name,
            children = children.len(),
            "Container dropped without dispose, disposing children"
        );
        for child in &children {
            child.dispose();
        }
    }
}

/// Handle to a node in the container tree
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a top-level container with default settings.
    ///
    /// The process-wide root is available through
    /// [`root_container`](crate::root_container); top-level containers created here
    /// are independent trees, mostly useful for isolation in tests.
    pub fn new(name: &str) -> Self {
        Self::with_settings(name, ContainerSettings::default())
    }

    /// Create a top-level container with explicit settings
    pub fn with_settings(name: &str, settings: ContainerSettings) -> Self {
        let container = Self::from_parts(name, None, settings);
        debug!(container = %container, "Created top-level container");
        container
    }

    fn from_parts(name: &str, parent: Option<Weak<ContainerInner>>, settings: ContainerSettings) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                uid: Uuid::new_v4(),
                name: normalize_name(name),
                parent,
                children: RwLock::new(Vec::new()),
                state: RwLock::new(ContainerState {
                    settings,
                    ..ContainerState::default()
                }),
                disposed: AtomicBool::new(false),
                listeners: ListenerSet::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner_arc(&self) -> Arc<ContainerInner> {
        Arc::clone(&self.inner)
    }

    pub fn uid(&self) -> Uuid {
        self.inner.uid
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Container::from_inner)
    }

    /// Parent, grandparent and so on up to the top of the tree
    pub fn ancestors(&self) -> Vec<Container> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(container) = current {
            current = container.parent();
            ancestors.push(container);
        }
        ancestors
    }

    /// Children in creation order
    pub fn children(&self) -> Vec<Container> {
        self.inner.children.read().clone()
    }

    /// Whether this container has no parent
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn manager(&self) -> Manager<'_> {
        Manager::new(self)
    }

    pub fn registrar(&self) -> Registrar<'_> {
        Registrar::new(self)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }

    pub fn configuration(&self) -> Configuration<'_> {
        Configuration::new(self)
    }

    /// Snapshot of this container's own registrations (ancestors excluded)
    pub fn registrations(&self) -> RegistrationRepository {
        self.inner.state.read().registrations.clone()
    }

    pub fn precluded_types(&self) -> Vec<TypeIdentifier> {
        self.inner.state.read().precluded.iter().copied().collect()
    }

    /// Listen to this container's notifications
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ContainerNotification) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.inner.listeners.unsubscribe(subscription)
    }

    /// Dispose this container and, depth-first, all of its children.
    ///
    /// Idempotent. Listeners receive [`ContainerEvent::Disposing`] before any teardown;
    /// afterwards the container holds no registrations, is detached from its parent and
    /// rejects further registration and resolution with
    /// [`IocError::ContainerDisposed`].
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!(container = %self, "Disposing container");
        self.notify(ContainerEvent::Disposing);

        let children = std::mem::take(&mut *self.inner.children.write());
        for child in &children {
            child.dispose();
        }

        {
            let mut state = self.inner.state.write();
            state.registrations.clear();
            state.precluded.clear();
        }

        if let Some(parent) = self.parent() {
            parent.detach_child(self);
        }

        self.inner.listeners.clear();
        debug!(container = %self, children = children.len(), "Container disposed");
    }

    /// Shorthand for [`Manager::create_child_container`]
    pub fn create_child(&self, name: &str) -> IocResult<Container> {
        self.ensure_live()?;
        let settings = self.inner.state.read().settings;
        let child = Self::from_parts(name, Some(Arc::downgrade(&self.inner)), settings);

        {
            let mut children = self.inner.children.write();
            // dispose() marks the node before taking the children list
            if self.is_disposed() {
                return Err(self.disposed_error());
            }
            children.push(child.clone());
        }

        debug!(parent = %self, child = %child, "Created child container");
        self.notify(ContainerEvent::ChildAdded { child: child.clone() });
        Ok(child)
    }

    fn detach_child(&self, child: &Container) {
        let removed = {
            let mut children = self.inner.children.write();
            let before = children.len();
            children.retain(|existing| existing.uid() != child.uid());
            children.len() != before
        };

        if removed {
            debug!(parent = %self, child = %child, "Detached child container");
            self.notify(ContainerEvent::ChildRemoved { child: child.clone() });
        }
    }

    pub(crate) fn state(&self) -> &RwLock<ContainerState> {
        &self.inner.state
    }

    pub(crate) fn notify(&self, event: ContainerEvent) {
        self.inner.listeners.notify(&ContainerNotification {
            source: self.clone(),
            event,
        });
    }

    pub(crate) fn ensure_live(&self) -> IocResult<()> {
        if self.is_disposed() {
            Err(self.disposed_error())
        } else {
            Ok(())
        }
    }

    pub(crate) fn disposed_error(&self) -> IocError {
        IocError::ContainerDisposed {
            container: self.to_string(),
        }
    }

    pub(crate) fn disabled(&self, feature: DisabledFeature) -> IocError {
        IocError::ConfigurationDisabled {
            container: self.to_string(),
            feature,
        }
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.inner.uid == other.inner.uid
    }
}

impl Eq for Container {}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.name.is_empty() {
            write!(f, "<unnamed> ({})", self.inner.uid)
        } else {
            write!(f, "'{}' ({})", self.inner.name, self.inner.uid)
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("uid", &self.inner.uid)
            .field("name", &self.inner.name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
