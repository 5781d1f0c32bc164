//! Container settings and the configuration facet
//!
//! Settings are plain data (`serde`, TOML-loadable). The [`Configuration`] facet
//! changes them on a live container until the container is locked.
//!
//! ```toml
//! allow_named_implementations = true
//! allow_preclusion_of_types = false
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::Container;
use crate::error::{DisabledFeature, IocError, IocResult};
use crate::events::ContainerEvent;
use crate::manager::Manager;
use crate::registrar::Registrar;
use crate::resolver::Resolver;

/// Per-container policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Permit registrations with a non-empty name
    pub allow_named_implementations: bool,
    /// Permit marking types as precluded
    pub allow_preclusion_of_types: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            allow_named_implementations: true,
            allow_preclusion_of_types: true,
        }
    }
}

impl ContainerSettings {
    /// Parse settings from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> IocResult<Self> {
        toml::from_str(source).map_err(|e| IocError::InvalidSettings {
            message: e.to_string(),
        })
    }

    pub fn to_toml_string(&self) -> IocResult<String> {
        toml::to_string(self).map_err(|e| IocError::InvalidSettings {
            message: e.to_string(),
        })
    }
}

/// Configuration view of a container
#[derive(Clone, Copy)]
pub struct Configuration<'a> {
    container: &'a Container,
}

impl<'a> Configuration<'a> {
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

    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.container)
    }

    pub fn settings(&self) -> ContainerSettings {
        self.container.state().read().settings
    }

    pub fn allow_named_implementations(&self) -> bool {
        self.settings().allow_named_implementations
    }

    pub fn allow_preclusion_of_types(&self) -> bool {
        self.settings().allow_preclusion_of_types
    }

    pub fn is_locked(&self) -> bool {
        self.container.state().read().locked
    }

    pub fn set_allow_named_implementations(&self, allow: bool) -> IocResult<()> {
        self.apply(ContainerSettings {
            allow_named_implementations: allow,
            ..self.settings()
        })
    }

    /// Disallowing preclusion also clears the container's precluded types
    pub fn set_allow_preclusion_of_types(&self, allow: bool) -> IocResult<()> {
        self.apply(ContainerSettings {
            allow_preclusion_of_types: allow,
            ..self.settings()
        })
    }

    /// Replace all settings at once
    pub fn apply(&self, settings: ContainerSettings) -> IocResult<()> {
        self.container.ensure_live()?;

        let released = {
            let mut state = self.container.state().write();
            if state.locked {
                return Err(self.container.disabled(DisabledFeature::Locked));
            }
            if state.settings == settings {
                return Ok(());
            }
            state.settings = settings;
            if settings.allow_preclusion_of_types {
                Vec::new()
            } else {
                state.precluded.drain().collect::<Vec<_>>()
            }
        };

        debug!(
            container = %self.container,
            ?settings,
            released = released.len(),
            "Container settings changed"
        );
        for service_type in released {
            self.container
                .notify(ContainerEvent::PrecludedTypeRemoved { service_type });
        }
        self.container.notify(ContainerEvent::ConfigurationChanged {
            settings,
            locked: false,
        });
        Ok(())
    }

    /// Lock the configuration. One-way; repeated calls have no further effect.
    ///
    /// Once locked, registering, unregistering, precluding and changing settings all
    /// fail with [`DisabledFeature::Locked`].
    pub fn lock(&self) {
        let settings = {
            let mut state = self.container.state().write();
            if state.locked {
                return;
            }
            state.locked = true;
            state.settings
        };

        debug!(container = %self.container, "Container configuration locked");
        self.container.notify(ContainerEvent::ConfigurationChanged {
            settings,
            locked: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_toml_defaults_missing_keys() {
        let settings = ContainerSettings::from_toml_str("allow_preclusion_of_types = false").unwrap();
        assert!(settings.allow_named_implementations);
        assert!(!settings.allow_preclusion_of_types);

        let empty = ContainerSettings::from_toml_str("").unwrap();
        assert_eq!(empty, ContainerSettings::default());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = ContainerSettings::from_toml_str("allow_named_implementations = \"yes\"");
        assert!(matches!(result, Err(IocError::InvalidSettings { .. })));
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let settings = ContainerSettings {
            allow_named_implementations: false,
            allow_preclusion_of_types: true,
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(ContainerSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_lock_blocks_setting_changes() {
        let container = Container::new("config");
        let configuration = container.configuration();

        configuration.set_allow_named_implementations(false).unwrap();
        assert!(!configuration.allow_named_implementations());

        configuration.lock();
        configuration.lock();
        assert!(configuration.is_locked());

        let result = configuration.set_allow_named_implementations(true);
        assert!(matches!(
            result,
            Err(IocError::ConfigurationDisabled {
                feature: DisabledFeature::Locked,
                ..
            })
        ));
        assert!(!configuration.allow_named_implementations());
    }
}
