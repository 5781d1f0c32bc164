//! Registration modules
//!
//! A [`RegistrationModule`] bundles the registrations of one feature area. Modules are
//! collected in a [`RegistrationModuleSet`] and applied to a container together:
//! ordered by priority, with every module's dependencies applied before it.
//!
//! ```rust
//! use lodestar_ioc::{Container, IocResult, Registrar, RegistrationModule, RegistrationModuleSet};
//!
//! struct StorageModule;
//!
//! impl RegistrationModule for StorageModule {
//!     fn name(&self) -> &'static str {
//!         "storage"
//!     }
//!
//!     fn register(&self, _registrar: &Registrar<'_>) -> IocResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut modules = RegistrationModuleSet::new();
//! modules.add(StorageModule);
//! modules.apply(&Container::new("app")).unwrap();
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::container::Container;
use crate::error::{IocError, IocResult};
use crate::registrar::Registrar;
use crate::resolver::Resolver;

/// A group of registrations applied to a container as one unit
pub trait RegistrationModule: Send + Sync {
    /// Unique name, used for dependency references and logging
    fn name(&self) -> &'static str;

    /// Lower values are applied first. Default is 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Names of modules that must be applied before this one
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    fn register(&self, registrar: &Registrar<'_>) -> IocResult<()>;

    /// Called once every module in the set has registered
    #[allow(unused_variables)]
    fn validate(&self, resolver: &Resolver<'_>) -> IocResult<()> {
        Ok(())
    }
}

/// Ordered collection of registration modules
#[derive(Default)]
pub struct RegistrationModuleSet {
    modules: Vec<Arc<dyn RegistrationModule>>,
}

impl RegistrationModuleSet {
    pub fn new() -> Self {
        Self { modules: Vec::new() }
    }

    pub fn add<M: RegistrationModule + 'static>(&mut self, module: M) -> &mut Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn add_shared(&mut self, module: Arc<dyn RegistrationModule>) -> &mut Self {
        self.modules.push(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Application order: priority first, insertion order between equal priorities,
    /// and dependencies always ahead of their dependents.
    pub fn ordered(&self) -> IocResult<Vec<Arc<dyn RegistrationModule>>> {
        let mut by_priority: Vec<&Arc<dyn RegistrationModule>> = self.modules.iter().collect();
        by_priority.sort_by_key(|m| m.priority());

        let index: HashMap<&'static str, &Arc<dyn RegistrationModule>> =
            by_priority.iter().map(|m| (m.name(), *m)).collect();

        let mut ordered = Vec::with_capacity(by_priority.len());
        let mut done: Vec<&'static str> = Vec::new();
        let mut path: Vec<&'static str> = Vec::new();
        for module in &by_priority {
            visit(module, &index, &mut path, &mut done, &mut ordered)?;
        }
        Ok(ordered)
    }

    /// Register every module with `container`, then validate them in the same order
    pub fn apply(&self, container: &Container) -> IocResult<()> {
        let ordered = self.ordered()?;
        info!(container = %container, modules = ordered.len(), "Applying registration modules");

        let registrar = container.registrar();
        for module in &ordered {
            debug!(module = module.name(), priority = module.priority(), "Registering module");
            module.register(&registrar)?;
        }

        let resolver = container.resolver();
        for module in &ordered {
            module.validate(&resolver)?;
        }

        info!(container = %container, "All registration modules applied");
        Ok(())
    }
}

fn visit(
    module: &Arc<dyn RegistrationModule>,
    index: &HashMap<&'static str, &Arc<dyn RegistrationModule>>,
    path: &mut Vec<&'static str>,
    done: &mut Vec<&'static str>,
    ordered: &mut Vec<Arc<dyn RegistrationModule>>,
) -> IocResult<()> {
    let name = module.name();
    if done.contains(&name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|visiting| *visiting == name) {
        let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
        cycle.push(name.to_string());
        return Err(IocError::ModuleDependencyCycle { cycle });
    }

    path.push(name);
    for dependency in module.dependencies() {
        let required = index
            .get(dependency)
            .ok_or_else(|| IocError::UnknownModuleDependency {
                module: name.to_string(),
                dependency: dependency.to_string(),
            })?;
        visit(required, index, path, done, ordered)?;
    }
    path.pop();

    done.push(name);
    ordered.push(Arc::clone(module));
    Ok(())
}
