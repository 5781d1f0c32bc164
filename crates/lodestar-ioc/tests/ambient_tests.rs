//! Tests for the process root, the ambient container pointer and static location
//!
//! Tests touching the process-wide pointer run under `#[serial]` and leave it pointing
//! at the root.

use lodestar_ioc::*;
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::Arc;

trait Greeting: Send + Sync {
    fn text(&self) -> &'static str;
}

#[derive(Default)]
struct Hello;

impl Greeting for Hello {
    fn text(&self) -> &'static str {
        "hello"
    }
}

#[derive(Default)]
struct Bonjour;

impl Greeting for Bonjour {
    fn text(&self) -> &'static str {
        "bonjour"
    }
}

service_contract!(dyn Greeting);
implements!(Hello => dyn Greeting);
implements!(Bonjour => dyn Greeting);

fn register_greeting(registrar: &Registrar<'_>) -> IocResult<()> {
    registrar.register_implementation::<dyn Greeting, Hello>()
}

inventory::submit! {
    SelfRegistration::new("ambient-tests-greeting", register_greeting)
}

#[test]
#[serial]
fn test_root_is_seeded_by_self_registration() {
    let root = root_container();
    assert!(root.is_root());
    assert!(list_self_registrations().contains(&"ambient-tests-greeting"));
    assert_eq!(root.resolver().resolve::<dyn Greeting>().unwrap().text(), "hello");
    assert_eq!(ambient_container(), Some(root.clone()));
}

#[test]
#[serial]
fn test_isolation_scope_shadows_and_restores() {
    let root = root_container().clone();
    {
        let scope = isolate("override").unwrap();
        scope
            .container()
            .registrar()
            .register_implementation::<dyn Greeting, Bonjour>()
            .unwrap();

        assert_eq!(locator::current_container().unwrap(), *scope.container());
        assert_eq!(locator::resolve::<dyn Greeting>().unwrap().text(), "bonjour");
        assert_eq!(scope.container().parent(), Some(root.clone()));
    }

    assert_eq!(ambient_container(), Some(root.clone()));
    assert_eq!(locator::resolve::<dyn Greeting>().unwrap().text(), "hello");
    assert!(root.children().is_empty());
}

#[test]
#[serial]
fn test_nested_isolation_falls_back_one_level() {
    let outer = isolate("outer").unwrap();
    {
        let inner = isolate("inner").unwrap();
        assert_eq!(inner.container().parent(), Some(outer.container().clone()));
        assert_eq!(ambient_container(), Some(inner.container().clone()));
    }
    assert_eq!(ambient_container(), Some(outer.container().clone()));
    drop(outer);
    assert_eq!(ambient_container(), Some(root_container().clone()));
}

#[test]
#[serial]
fn test_disposing_ambient_grandchild_subtree() {
    let root = root_container().clone();
    let parent = root.create_child("parent").unwrap();
    let grandchild = parent.create_child("grandchild").unwrap();
    set_ambient_container(&grandchild).unwrap();

    parent.dispose();
    assert_eq!(ambient_container(), Some(root));
}

#[test]
#[serial]
fn test_locator_named_and_try_resolution() {
    let scope = isolate("named").unwrap();
    scope
        .container()
        .registrar()
        .register_named_implementation::<dyn Greeting, Bonjour>("fr")
        .unwrap();

    assert_eq!(locator::resolve_named::<dyn Greeting>("fr").unwrap().text(), "bonjour");
    assert!(locator::try_resolve_named::<dyn Greeting>("de").is_none());
    assert_eq!(locator::try_resolve::<dyn Greeting>().unwrap().text(), "hello");
}

#[test]
fn test_private_manager_fallback_chain() {
    let root = Container::new("private-root");
    let manager = AmbientContainerManager::new(root.clone());
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    manager.subscribe(move |changed: &AmbientContainerChanged| {
        sink.lock().push(
            changed
                .current
                .as_ref()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "<none>".to_string()),
        );
    });

    let child = root.create_child("child").unwrap();
    let grandchild = child.create_child("grandchild").unwrap();
    manager.set_ambient_container(&grandchild).unwrap();
    grandchild.dispose();
    assert_eq!(manager.current(), Some(child.clone()));

    child.dispose();
    assert_eq!(manager.current(), Some(root.clone()));

    root.dispose();
    assert_eq!(manager.current(), None);

    assert_eq!(
        changes.lock().clone(),
        vec!["grandchild", "child", "private-root", "<none>"]
    );
}

#[test]
fn test_private_manager_restore_root() {
    let root = Container::new("private-root");
    let manager = AmbientContainerManager::new(root.clone());
    let child = root.create_child("child").unwrap();

    manager.set_ambient_container(&child).unwrap();
    manager.restore_root().unwrap();
    assert_eq!(manager.current(), Some(root));

    // The child is no longer watched
    child.dispose();
    assert_eq!(manager.current(), Some(manager.root().clone()));
}

#[test]
fn test_private_manager_scope_on_independent_tree() {
    let root = Container::new("private-root");
    let manager = AmbientContainerManager::new(root.clone());
    let scope = manager.isolate("scoped").unwrap();
    let scoped = scope.container().clone();
    assert_eq!(manager.current(), Some(scoped.clone()));

    drop(scope);
    assert!(scoped.is_disposed());
    assert_eq!(manager.current(), Some(root));
}

#[test]
fn test_private_manager_falls_back_to_root_from_foreign_tree() {
    let root = Container::new("private-root");
    let manager = AmbientContainerManager::new(root.clone());
    let foreign = Container::new("foreign");
    let nested = foreign.create_child("nested").unwrap();

    manager.set_ambient_container(&nested).unwrap();
    nested.dispose();
    assert_eq!(manager.current(), Some(foreign.clone()));

    // No live ancestor is left, so the pointer lands on the manager's root
    manager.set_ambient_container(&foreign).unwrap();
    foreign.dispose();
    assert_eq!(manager.current(), Some(root));
}
