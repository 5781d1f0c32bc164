//! Errors raised by the registry

use std::fmt;

/// Container feature that a failing call needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledFeature {
    /// The container's configuration has been locked
    Locked,
    /// Named registrations are disallowed by the container's settings
    NamedImplementations,
    /// Type preclusion is disallowed by the container's settings
    Preclusion,
}

impl fmt::Display for DisabledFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisabledFeature::Locked => f.write_str("configuration is locked"),
            DisabledFeature::NamedImplementations => f.write_str("named implementations are not allowed"),
            DisabledFeature::Preclusion => f.write_str("preclusion of types is not allowed"),
        }
    }
}

/// Errors that can occur during registration and resolution
#[derive(Debug, thiserror::Error)]
pub enum IocError {
    #[error("Type {service_type} is precluded in container {container}")]
    TypePrecluded { container: String, service_type: String },

    #[error("A registration for {key} already exists in container {container}")]
    DuplicateRegistration { container: String, key: String },

    #[error("Type {service_type} is registered in container {container} and cannot be precluded")]
    RegisteredTypeCannotBePrecluded { container: String, service_type: String },

    #[error("Container {container}: {feature}")]
    ConfigurationDisabled { container: String, feature: DisabledFeature },

    #[error("Invalid service type {service_type}: {reason}")]
    InvalidServiceType { service_type: String, reason: String },

    #[error("Invalid implementation type {implementation} for {service_type}: {reason}")]
    InvalidImplementationType {
        service_type: String,
        implementation: String,
        reason: String,
    },

    #[error("Unable to resolve {service_type}{}", display_name(name))]
    Resolution { service_type: String, name: String },

    #[error("Failed to construct {implementation} for {service_type}: {reason}")]
    ImplementationConstruction {
        service_type: String,
        implementation: String,
        reason: String,
    },

    #[error("Container {container} has been disposed")]
    ContainerDisposed { container: String },

    #[error("No ambient container is available")]
    NoAmbientContainer,

    #[error("Invalid container settings: {message}")]
    InvalidSettings { message: String },

    #[error("Registration module '{module}' depends on unknown module '{dependency}'")]
    UnknownModuleDependency { module: String, dependency: String },

    #[error("Registration modules form a dependency cycle: {}", cycle.join(" -> "))]
    ModuleDependencyCycle { cycle: Vec<String> },
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!(" (named '{}')", name)
    }
}

impl IocError {
    /// Whether this error means "nothing suitable is registered" rather than a
    /// programming defect
    pub fn is_not_found(&self) -> bool {
        matches!(self, IocError::Resolution { .. } | IocError::TypePrecluded { .. })
    }
}

pub type IocResult<T> = Result<T, IocError>;
