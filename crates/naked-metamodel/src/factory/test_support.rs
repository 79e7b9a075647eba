//! Shared fixture for factory unit tests

use std::sync::Arc;

use crate::class_strategy::DefaultClassStrategy;
use crate::config::ReflectorConfig;
use crate::reflect::{AssemblyInfo, MethodInfo, PropertyInfo, TypeCatalog, TypeInfo};

use super::FactoryContext;

pub(crate) struct Fixture {
    pub catalog: TypeCatalog,
    pub strategy: DefaultClassStrategy,
    pub config: ReflectorConfig,
    pub type_info: Arc<TypeInfo>,
    pub methods: Vec<MethodInfo>,
    pub properties: Vec<PropertyInfo>,
}

impl Fixture {
    /// Catalog holding `type_info`, `Shop.Product` and any extra types
    pub fn new(type_info: TypeInfo) -> Self {
        Self::with_types(type_info, Vec::new())
    }

    pub fn with_types(type_info: TypeInfo, extra: Vec<TypeInfo>) -> Self {
        let name = type_info.full_name.clone();
        let mut assembly = AssemblyInfo::new("Shop")
            .with_type(type_info)
            .with_type(TypeInfo::class("Shop.Product"));
        for t in extra {
            assembly = assembly.with_type(t);
        }
        let catalog = TypeCatalog::from_assemblies(&[assembly]);
        let type_info = catalog.get(&name).expect("registered");
        let methods = catalog.all_methods(&name);
        let properties = catalog.all_properties(&name);
        Self {
            catalog,
            strategy: DefaultClassStrategy::default(),
            config: ReflectorConfig::default(),
            type_info,
            methods,
            properties,
        }
    }

    pub fn ctx(&self) -> FactoryContext<'_> {
        FactoryContext {
            catalog: &self.catalog,
            class_strategy: &self.strategy,
            config: &self.config,
            type_info: &self.type_info,
            methods: &self.methods,
            properties: &self.properties,
        }
    }

    pub fn method(&self, name: &str) -> &MethodInfo {
        self.methods.iter().find(|m| m.name == name).expect("method")
    }

    pub fn property(&self, name: &str) -> &PropertyInfo {
        self.properties.iter().find(|p| p.name == name).expect("property")
    }
}
