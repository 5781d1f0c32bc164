//! Process root container and the ambient container pointer
//!
//! The ambient container is the container that [`locator`](crate::locator) calls resolve
//! through. Tests swap it for an isolated child and swap it back afterwards; readers load
//! it with a single atomic pointer read and never block.
//!
//! When the ambient container is disposed the pointer falls back to the nearest ancestor
//! that is still alive, else to the manager's root, else to nothing. Nothing only happens
//! once the root itself has been disposed.

use arc_swap::ArcSwapOption;
use lodestar_common::listeners::{ListenerSet, SubscriptionId};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use crate::container::{Container, ContainerInner};
use crate::discovery::apply_self_registrations;
use crate::error::IocResult;
use crate::events::{ContainerEvent, ContainerNotification};

static ROOT_CONTAINER: Lazy<Container> = Lazy::new(|| {
    let root = Container::new("root");
    match apply_self_registrations(&root) {
        Ok(applied) => info!(container = %root, applied, "Root container created"),
        Err(error) => warn!(container = %root, error = %error, "Self-registration failed for root container"),
    }
    root
});

static AMBIENT: Lazy<AmbientContainerManager> =
    Lazy::new(|| AmbientContainerManager::new(ROOT_CONTAINER.clone()));

/// The process root container. Created, and seeded with self-registrations, on first
/// access; it lives for the rest of the process.
pub fn root_container() -> &'static Container {
    &ROOT_CONTAINER
}

/// The process-wide ambient container manager, initially pointing at the root
pub fn ambient_manager() -> &'static AmbientContainerManager {
    &AMBIENT
}

/// The current ambient container, or `None` once the root has been disposed
pub fn ambient_container() -> Option<Container> {
    ambient_manager().current()
}

/// Make `container` the process-wide ambient container
pub fn set_ambient_container(container: &Container) -> IocResult<()> {
    ambient_manager().set_ambient_container(container)
}

/// Enter an isolation scope on the process-wide manager.
/// See [`AmbientContainerManager::isolate`].
pub fn isolate(name: &str) -> IocResult<AmbientContainerScope> {
    ambient_manager().isolate(name)
}

/// Notification fired whenever the ambient pointer changes
#[derive(Debug, Clone)]
pub struct AmbientContainerChanged {
    pub previous: Option<Container>,
    pub current: Option<Container>,
}

/// Container currently pointed at, with the subscription watching its disposal
struct Watch {
    container: Container,
    subscription: SubscriptionId,
}

struct AmbientState {
    root: Container,
    current: ArcSwapOption<ContainerInner>,
    /// Serialises pointer transitions; never held while a container is disposed
    transition: Mutex<Option<Watch>>,
    listeners: ListenerSet<AmbientContainerChanged>,
}

/// Owner of an ambient container pointer.
///
/// Cloning yields another handle to the same pointer.
#[derive(Clone)]
pub struct AmbientContainerManager {
    state: Arc<AmbientState>,
}

impl AmbientContainerManager {
    /// Create a manager whose pointer starts at `root`
    pub fn new(root: Container) -> Self {
        let manager = Self {
            state: Arc::new(AmbientState {
                root: root.clone(),
                current: ArcSwapOption::empty(),
                transition: Mutex::new(None),
                listeners: ListenerSet::new(),
            }),
        };

        let changed = {
            let mut watch = manager.state.transition.lock();
            AmbientState::swap_locked(&manager.state, &mut watch, Some(root))
        };
        manager.state.publish(changed);
        manager
    }

    /// The container this manager falls back to when nothing else is alive
    pub fn root(&self) -> &Container {
        &self.state.root
    }

    /// Current ambient container. Lock-free.
    pub fn current(&self) -> Option<Container> {
        self.state.current.load_full().map(Container::from_inner)
    }

    /// Point the ambient pointer at `container`.
    ///
    /// The previous container stops being watched; disposal of `container` will move
    /// the pointer to its nearest live ancestor.
    pub fn set_ambient_container(&self, container: &Container) -> IocResult<()> {
        container.ensure_live()?;

        let changed = {
            let mut watch = self.state.transition.lock();
            let changed = AmbientState::swap_locked(&self.state, &mut watch, Some(container.clone()));
            // Disposal may have started before the subscription was in place
            if container.is_disposed() {
                let fallback = self.state.fallback_for(container);
                let fell_back = AmbientState::swap_locked(&self.state, &mut watch, fallback);
                merge(changed, fell_back)
            } else {
                changed
            }
        };

        self.state.publish(changed);
        Ok(())
    }

    /// Point the ambient pointer back at the root
    pub fn restore_root(&self) -> IocResult<()> {
        self.set_ambient_container(&self.state.root)
    }

    /// Create a child of the current ambient container (or of the root when there is
    /// none), make it ambient, and dispose it when the returned scope is dropped.
    pub fn isolate(&self, name: &str) -> IocResult<AmbientContainerScope> {
        let parent = self.current().unwrap_or_else(|| self.state.root.clone());
        let container = parent.manager().create_child_container(name)?;
        if let Err(error) = self.set_ambient_container(&container) {
            container.dispose();
            return Err(error);
        }

        debug!(container = %container, parent = %parent, "Entered ambient isolation scope");
        Ok(AmbientContainerScope {
            container,
            manager: self.clone(),
        })
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&AmbientContainerChanged) + Send + Sync + 'static,
    {
        self.state.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.state.listeners.unsubscribe(subscription)
    }
}

impl fmt::Debug for AmbientContainerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientContainerManager")
            .field("root", &self.state.root)
            .field("current", &self.current())
            .finish()
    }
}

impl AmbientState {
    /// Swap the pointer to `next`, moving the disposal watch along with it.
    /// Must be called with the transition lock held.
    fn swap_locked(
        state: &Arc<AmbientState>,
        watch: &mut Option<Watch>,
        next: Option<Container>,
    ) -> Option<AmbientContainerChanged> {
        let previous = watch.take();
        let unchanged = match (&previous, &next) {
            (Some(old), Some(new)) => old.container == *new,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            *watch = previous;
            return None;
        }

        if let Some(old) = &previous {
            old.container.unsubscribe(old.subscription);
        }

        *watch = next.as_ref().map(|container| Watch {
            container: container.clone(),
            subscription: Self::watch_disposal(state, container),
        });
        state
            .current
            .store(next.as_ref().map(Container::inner_arc));

        let previous = previous.map(|old| old.container);
        debug!(
            previous = ?previous.as_ref().map(|c| c.to_string()),
            current = ?next.as_ref().map(|c| c.to_string()),
            "Ambient container changed"
        );
        Some(AmbientContainerChanged {
            previous,
            current: next,
        })
    }

    fn watch_disposal(state: &Arc<AmbientState>, container: &Container) -> SubscriptionId {
        let weak: Weak<AmbientState> = Arc::downgrade(state);
        container.subscribe(move |notification: &ContainerNotification| {
            if matches!(notification.event, ContainerEvent::Disposing) {
                if let Some(state) = weak.upgrade() {
                    AmbientState::on_disposing(&state, &notification.source);
                }
            }
        })
    }

    fn on_disposing(state: &Arc<AmbientState>, disposed: &Container) {
        let changed = {
            let mut watch = state.transition.lock();
            let is_current = watch
                .as_ref()
                .map_or(false, |current| current.container == *disposed);
            if !is_current {
                return;
            }
            let fallback = state.fallback_for(disposed);
            AmbientState::swap_locked(state, &mut watch, fallback)
        };

        state.publish(changed);
    }

    /// Nearest live ancestor of `disposed`, else the root if alive, else nothing
    fn fallback_for(&self, disposed: &Container) -> Option<Container> {
        if *disposed == self.root {
            return None;
        }
        disposed
            .ancestors()
            .into_iter()
            .find(|ancestor| !ancestor.is_disposed())
            .or_else(|| (!self.root.is_disposed()).then(|| self.root.clone()))
    }

    fn publish(&self, changed: Option<AmbientContainerChanged>) {
        if let Some(changed) = changed {
            self.listeners.notify(&changed);
        }
    }
}

/// Combine two consecutive transitions into one notification
fn merge(
    first: Option<AmbientContainerChanged>,
    second: Option<AmbientContainerChanged>,
) -> Option<AmbientContainerChanged> {
    match (first, second) {
        (Some(first), Some(second)) => Some(AmbientContainerChanged {
            previous: first.previous,
            current: second.current,
        }),
        (first, second) => first.or(second),
    }
}

/// Guard returned by [`AmbientContainerManager::isolate`].
///
/// Disposes its container on drop, which moves the ambient pointer back to the
/// container that was ambient when the scope was entered (if that is still alive).
pub struct AmbientContainerScope {
    container: Container,
    manager: AmbientContainerManager,
}

impl AmbientContainerScope {
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn manager(&self) -> &AmbientContainerManager {
        &self.manager
    }
}

impl fmt::Debug for AmbientContainerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientContainerScope")
            .field("container", &self.container)
            .finish()
    }
}

impl Drop for AmbientContainerScope {
    fn drop(&mut self) {
        debug!(container = %self.container, "Leaving ambient isolation scope");
        self.container.dispose();
    }
}
