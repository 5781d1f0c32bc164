//! Registration keys

use std::fmt;

use crate::types::{ServiceType, TypeIdentifier};

/// `(service type, name)` pair identifying one registration within a container.
///
/// The name is trimmed on construction; an empty name denotes the default
/// registration for the type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationKey {
    service_type: TypeIdentifier,
    name: String,
}

impl RegistrationKey {
    pub fn new(service_type: TypeIdentifier, name: &str) -> Self {
        Self {
            service_type,
            name: normalize_name(name),
        }
    }

    /// Key of the default registration for `service_type`
    pub fn default_for(service_type: TypeIdentifier) -> Self {
        Self {
            service_type,
            name: String::new(),
        }
    }

    /// Key for a declared service type
    pub fn of<T: ?Sized + ServiceType>(name: &str) -> Self {
        Self::new(TypeIdentifier::of::<T>(), name)
    }

    pub fn service_type(&self) -> TypeIdentifier {
        self.service_type
    }

    /// Normalised name; empty for the default registration
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "{} (default)", self.service_type)
        } else {
            write!(f, "{} (named '{}')", self.service_type, self.name)
        }
    }
}

/// Trim a registration or container name
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}
