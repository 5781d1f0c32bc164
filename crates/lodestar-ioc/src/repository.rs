//! Per-container registration storage

use std::collections::HashMap;

use crate::key::RegistrationKey;
use crate::types::TypeIdentifier;
use crate::value::RegistrationValue;

/// Mapping from [`RegistrationKey`] to [`RegistrationValue`] for exactly one container.
///
/// Callers receive snapshots through
/// [`Container::registrations`](crate::Container::registrations); only the registrar
/// mutates the live repository.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRepository {
    entries: HashMap<RegistrationKey, RegistrationValue>,
}

impl RegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RegistrationKey) -> Option<&RegistrationValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &RegistrationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether any registration (default or named) exists for `service_type`
    pub fn contains_type(&self, service_type: &TypeIdentifier) -> bool {
        self.entries.keys().any(|key| key.service_type() == *service_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RegistrationKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegistrationKey, &RegistrationValue)> {
        self.entries.iter()
    }

    /// Names registered for `service_type`; the default registration appears as `""`
    pub fn names_for(&self, service_type: &TypeIdentifier) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.service_type() == *service_type)
            .map(|key| key.name().to_string())
            .collect();
        names.sort();
        names
    }

    pub(crate) fn insert(&mut self, key: RegistrationKey, value: RegistrationValue) {
        self.entries.insert(key, value);
    }

    pub(crate) fn remove(&mut self, key: &RegistrationKey) -> Option<RegistrationValue> {
        self.entries.remove(key)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
