//! Class strategy: which types take part in the domain model

use std::sync::Arc;

use crate::config::{in_namespace, ReflectorConfig};
use crate::reflect::{AssemblyInfo, MethodInfo, TypeInfo, TypeKind};

/// Namespace of persistence-layer proxy types
pub const PROXY_NAMESPACE: &str = "System.Data.Entity.DynamicProxies";

/// Framework namespaces never introspected
const SYSTEM_PREFIXES: &[&str] = &["System.", "Microsoft."];

/// Methods inherited from the root object type
const SYSTEM_METHODS: &[&str] = &[
    "GetHashCode",
    "Equals",
    "GetType",
    "Finalize",
    "MemberwiseClone",
    "ReferenceEquals",
];

/// Decides which reflected types and methods take part in the model
pub trait ClassStrategy: Send + Sync {
    /// Whether a type is introspected at all
    fn is_type_to_be_introspected(&self, type_info: &TypeInfo) -> bool;

    /// Name under which a type is introspected; proxies map to their base type
    fn filter_type(&self, type_info: &TypeInfo) -> Option<String>;

    /// Drop methods that never take part in the model
    fn filter_methods(&self, methods: Vec<MethodInfo>) -> Vec<MethodInfo>;

    /// Whether a type is a registered service
    fn is_service(&self, full_name: &str) -> bool;

    /// Supply an assembly declaring a type missing from the scan
    fn load_speculative_assembly(&self, type_name: &str) -> Option<AssemblyInfo>;
}

/// Class strategy driven by `ReflectorConfig`
#[derive(Debug, Clone, Default)]
pub struct DefaultClassStrategy {
    config: Arc<ReflectorConfig>,
    speculative: Vec<AssemblyInfo>,
}

impl DefaultClassStrategy {
    /// Create a strategy over a configuration
    pub fn new(config: Arc<ReflectorConfig>) -> Self {
        Self {
            config,
            speculative: Vec::new(),
        }
    }

    /// Offer an assembly that is loaded only if one of its types is asked for
    pub fn with_speculative_assembly(mut self, assembly: AssemblyInfo) -> Self {
        self.speculative.push(assembly);
        self
    }

    fn is_system_type(name: &str) -> bool {
        SYSTEM_PREFIXES.iter().any(|p| name.starts_with(p))
    }

    fn is_proxy(name: &str) -> bool {
        in_namespace(name, PROXY_NAMESPACE)
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.config
            .ignored_namespaces
            .iter()
            .any(|ns| in_namespace(name, ns))
    }

    fn is_registered(&self, name: &str) -> bool {
        let c = &self.config;
        if c.types.is_empty() && c.namespaces.is_empty() && c.services.is_empty() {
            return true;
        }
        c.types.iter().any(|t| t == name)
            || c.services.iter().any(|s| s == name)
            || c.namespaces.iter().any(|ns| in_namespace(name, ns))
    }
}

impl ClassStrategy for DefaultClassStrategy {
    fn is_type_to_be_introspected(&self, type_info: &TypeInfo) -> bool {
        if type_info.kind == TypeKind::Primitive {
            return true;
        }
        let name = type_info.full_name.as_str();
        !type_info.is_generated
            && !Self::is_proxy(name)
            && !Self::is_system_type(name)
            && !self.is_ignored(name)
            && self.is_registered(name)
    }

    fn filter_type(&self, type_info: &TypeInfo) -> Option<String> {
        if Self::is_proxy(&type_info.full_name) {
            return type_info.superclass.clone();
        }
        if self.is_type_to_be_introspected(type_info) {
            Some(type_info.full_name.clone())
        } else {
            None
        }
    }

    fn filter_methods(&self, methods: Vec<MethodInfo>) -> Vec<MethodInfo> {
        methods
            .into_iter()
            .filter(|m| m.is_public && !SYSTEM_METHODS.contains(&m.name.as_str()))
            .collect()
    }

    fn is_service(&self, full_name: &str) -> bool {
        self.config.services.iter().any(|s| s == full_name)
    }

    fn load_speculative_assembly(&self, type_name: &str) -> Option<AssemblyInfo> {
        self.speculative
            .iter()
            .find(|a| a.types.iter().any(|t| t.full_name == type_name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeRef;

    fn strategy() -> DefaultClassStrategy {
        let mut config = ReflectorConfig::default()
            .with_namespace("Shop")
            .with_service("Services.Repository");
        config.ignored_namespaces.push("Shop.Internal".into());
        DefaultClassStrategy::new(Arc::new(config))
    }

    #[test]
    fn test_introspection_filter() {
        let s = strategy();
        assert!(s.is_type_to_be_introspected(&TypeInfo::class("Shop.Customer")));
        assert!(s.is_type_to_be_introspected(&TypeInfo::class("Services.Repository")));
        assert!(!s.is_type_to_be_introspected(&TypeInfo::class("Billing.Invoice")));
        assert!(!s.is_type_to_be_introspected(&TypeInfo::class("Shop.Internal.Cache")));
        assert!(!s.is_type_to_be_introspected(&TypeInfo::class("System.Object")));
        assert!(!s.is_type_to_be_introspected(&TypeInfo::class("Shop.Closure").generated()));
    }

    #[test]
    fn test_proxy_maps_to_base() {
        let s = strategy();
        let proxy = TypeInfo::class(format!("{}.Customer_1A2B", PROXY_NAMESPACE)).extends("Shop.Customer");
        assert!(!s.is_type_to_be_introspected(&proxy));
        assert_eq!(s.filter_type(&proxy).as_deref(), Some("Shop.Customer"));
    }

    #[test]
    fn test_filter_methods_drops_system_and_private() {
        let s = strategy();
        let methods = vec![
            MethodInfo::new("GetHashCode", TypeRef::Void),
            MethodInfo::new("Helper", TypeRef::Void).private(),
            MethodInfo::new("Order", TypeRef::Void),
        ];
        let kept = s.filter_methods(methods);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Order");
    }

    #[test]
    fn test_speculative_assembly() {
        let s = strategy().with_speculative_assembly(
            AssemblyInfo::new("Extras").with_type(TypeInfo::class("Shop.Extra")),
        );
        assert_eq!(s.load_speculative_assembly("Shop.Extra").map(|a| a.name), Some("Extras".to_string()));
        assert!(s.load_speculative_assembly("Shop.Other").is_none());
    }
}
