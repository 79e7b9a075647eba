//! Reflector configuration (`naked.toml`)
//!
//! ```toml
//! types = ["Shop.Address"]
//! namespaces = ["Shop"]
//! services = ["Shop.CustomerRepository"]
//! ignored_namespaces = ["Shop.Migrations"]
//! parallel = true
//! concurrency = 4
//!
//! [authorizers]
//! "Shop.Customer" = "CustomerAuthorizer"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ReflectionError, ReflectionResult};
use crate::reflect::TypeCatalog;

/// What the reflector scans and how
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectorConfig {
    /// Types registered explicitly by full name
    pub types: Vec<String>,
    /// Namespaces whose types are all introspected
    pub namespaces: Vec<String>,
    /// Service types, in menu order
    pub services: Vec<String>,
    /// Namespaces never introspected
    pub ignored_namespaces: Vec<String>,
    /// Use the parallel reflector
    pub parallel: bool,
    /// Worker count for the parallel reflector (defaults to the CPU count)
    pub concurrency: Option<usize>,
    /// Type authorizer name per type
    pub authorizers: BTreeMap<String, String>,
}

impl FromStr for ReflectorConfig {
    type Err = ReflectionError;

    /// Parse from TOML text
    fn from_str(content: &str) -> ReflectionResult<Self> {
        let config: ReflectorConfig = toml::from_str(content)?;
        Ok(config)
    }
}

impl ReflectorConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> ReflectionResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ReflectionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Serialise to TOML text
    pub fn to_toml_string(&self) -> ReflectionResult<String> {
        toml::to_string_pretty(self).map_err(|e| ReflectionError::initialisation(e.to_string()))
    }

    /// Add an explicitly registered type
    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.types.push(name.into());
        self
    }

    /// Add a namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// Add a service
    pub fn with_service(mut self, name: impl Into<String>) -> Self {
        self.services.push(name.into());
        self
    }

    /// Worker count for the parallel reflector
    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Check the configuration against the scanned types
    ///
    /// Every explicit type and service must exist, every namespace must match
    /// at least one type, and authorizers may only be registered for concrete
    /// types.
    pub fn validate(&self, catalog: &TypeCatalog) -> ReflectionResult<()> {
        if self.concurrency == Some(0) {
            return Err(ReflectionError::initialisation(
                "concurrency must be at least 1",
            ));
        }

        for name in &self.types {
            if !catalog.contains(name) {
                return Err(ReflectionError::initialisation(format!(
                    "registered type {} was not found in any assembly",
                    name
                )));
            }
        }

        for name in &self.services {
            if !catalog.contains(name) {
                return Err(ReflectionError::initialisation(format!(
                    "registered service {} was not found in any assembly",
                    name
                )));
            }
        }

        for namespace in &self.namespaces {
            let matched = catalog.iter().any(|t| in_namespace(&t.full_name, namespace));
            if !matched {
                return Err(ReflectionError::initialisation(format!(
                    "namespace {} matched no types",
                    namespace
                )));
            }
        }

        for (type_name, authorizer) in &self.authorizers {
            if authorizer.is_empty() {
                return Err(ReflectionError::initialisation(format!(
                    "authorizer for {} has no name",
                    type_name
                )));
            }
            match catalog.get(type_name) {
                None => {
                    return Err(ReflectionError::initialisation(format!(
                        "authorizer registered for unknown type {}",
                        type_name
                    )))
                }
                Some(t) if t.is_abstract || t.is_interface() => {
                    return Err(ReflectionError::initialisation(format!(
                        "authorizer registered for abstract type {}; authorizers must be registered for concrete types",
                        type_name
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Whether `full_name` lies in `namespace` (exact segment prefix)
pub fn in_namespace(full_name: &str, namespace: &str) -> bool {
    full_name
        .strip_prefix(namespace)
        .map(|rest| rest.starts_with('.'))
        .unwrap_or(false)
}
