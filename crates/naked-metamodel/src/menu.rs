//! Main menus
//!
//! A menu holds only names: the service type and action name of each
//! entry. Runtime layers resolve them against the metamodel, so menus can be
//! built and compared without touching specifications.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{ReflectionError, ReflectionResult};
use crate::facet::{FacetHolder, MemberOrderFacet};
use crate::spec::Specification;

/// Custom menu layout for one type, registered by name
pub type MenuDefinition = Arc<dyn Fn(&mut MenuBuilder<'_>) -> ReflectionResult<()> + Send + Sync>;

/// One entry of a menu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MenuItem {
    /// An action of a service
    Action {
        /// Service type full name
        service: String,
        /// Action member name
        action: String,
        /// Label shown
        name: String,
    },
    /// Nested menu
    SubMenu(Menu),
}

/// A named, ordered list of menu items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Menu {
    /// Label shown
    pub name: String,
    /// Stable id; the owning type for top-level menus
    pub id: String,
    /// Items in display order
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Empty menu
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            items: Vec::new(),
        }
    }

    /// Every `(service, action)` pair, depth first
    pub fn actions(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_actions(&mut out);
        out
    }

    fn collect_actions<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        for item in &self.items {
            match item {
                MenuItem::Action { service, action, .. } => out.push((service, action)),
                MenuItem::SubMenu(menu) => menu.collect_actions(out),
            }
        }
    }

    /// Sub-menu by label
    pub fn sub_menu(&self, name: &str) -> Option<&Menu> {
        self.items.iter().find_map(|item| match item {
            MenuItem::SubMenu(menu) if menu.name == name => Some(menu),
            _ => None,
        })
    }

    /// Whether the menu has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builds a menu against the introspected specifications
pub struct MenuBuilder<'a> {
    specs: &'a FxHashMap<String, Arc<Specification>>,
    type_name: String,
    menu: Menu,
    added: FxHashSet<(String, String)>,
}

impl<'a> MenuBuilder<'a> {
    /// Start a menu for `type_name`
    pub fn new(
        specs: &'a FxHashMap<String, Arc<Specification>>,
        type_name: &str,
        menu_name: &str,
    ) -> Self {
        Self {
            specs,
            type_name: type_name.to_string(),
            menu: Menu::new(menu_name, type_name),
            added: FxHashSet::default(),
        }
    }

    /// The default menu: every action in member order, grouped into
    /// sub-menus by member-order name
    pub fn default_menu(
        specs: &'a FxHashMap<String, Arc<Specification>>,
        type_name: &str,
    ) -> ReflectionResult<Menu> {
        let spec = Self::lookup(specs, type_name)?;
        let mut builder = Self::new(specs, type_name, spec.name());
        let mut groups: Vec<(String, Menu)> = Vec::new();
        for action in spec.actions() {
            let group = action
                .get::<MemberOrderFacet>()
                .map(|o| o.name.clone())
                .filter(|n| !n.is_empty());
            match group {
                None => builder.add_action(action.member_name(), None)?,
                Some(group) => {
                    let item = builder.item(type_name, action, None);
                    let slot = match groups.iter().position(|(g, _)| *g == group) {
                        Some(slot) => slot,
                        None => {
                            let menu = Menu::new(group.clone(), format!("{}-{}", type_name, group));
                            groups.push((group, menu));
                            groups.len() - 1
                        }
                    };
                    groups[slot].1.items.push(item);
                }
            }
        }
        for (_, menu) in groups {
            builder.menu.items.push(MenuItem::SubMenu(menu));
        }
        Ok(builder.build())
    }

    fn lookup<'s>(
        specs: &'s FxHashMap<String, Arc<Specification>>,
        type_name: &str,
    ) -> ReflectionResult<&'s Arc<Specification>> {
        specs.get(type_name).ok_or_else(|| {
            ReflectionError::initialisation(format!("menu refers to unknown type {}", type_name))
        })
    }

    fn item(&mut self, service: &str, action: &Specification, renamed_to: Option<&str>) -> MenuItem {
        let action_name = action.member_name().to_string();
        self.added.insert((service.to_string(), action_name.clone()));
        MenuItem::Action {
            service: service.to_string(),
            action: action_name,
            name: renamed_to.unwrap_or_else(|| action.name()).to_string(),
        }
    }

    /// Add an action of the menu's own type
    pub fn add_action(&mut self, action: &str, renamed_to: Option<&str>) -> ReflectionResult<()> {
        let service = self.type_name.clone();
        self.add_action_from(&service, action, renamed_to)
    }

    /// Add an action of another service
    pub fn add_action_from(
        &mut self,
        service: &str,
        action: &str,
        renamed_to: Option<&str>,
    ) -> ReflectionResult<()> {
        let spec = Self::lookup(self.specs, service)?;
        let action_spec = spec.action_named(action).ok_or_else(|| {
            ReflectionError::initialisation(format!("menu refers to unknown action {}.{}", service, action))
        })?;
        let item = self.item(service, action_spec, renamed_to);
        self.menu.items.push(item);
        Ok(())
    }

    /// Add every action of the menu's own type not added yet
    pub fn add_all_remaining_actions(&mut self) -> ReflectionResult<()> {
        let service = self.type_name.clone();
        self.add_all_remaining_actions_from(&service)
    }

    /// Add every action of `service` not added yet, in member order
    pub fn add_all_remaining_actions_from(&mut self, service: &str) -> ReflectionResult<()> {
        let spec = Self::lookup(self.specs, service)?;
        for action in spec.actions() {
            let key = (service.to_string(), action.member_name().to_string());
            if !self.added.contains(&key) {
                let item = self.item(service, action, None);
                self.menu.items.push(item);
            }
        }
        Ok(())
    }

    /// Build a sub-menu with `define` and append it
    pub fn create_sub_menu<F>(&mut self, name: &str, define: F) -> ReflectionResult<()>
    where
        F: FnOnce(&mut MenuBuilder<'a>) -> ReflectionResult<()>,
    {
        let mut sub = MenuBuilder {
            specs: self.specs,
            type_name: self.type_name.clone(),
            menu: Menu::new(name, format!("{}-{}", self.type_name, name)),
            added: std::mem::take(&mut self.added),
        };
        define(&mut sub)?;
        self.added = sub.added;
        self.menu.items.push(MenuItem::SubMenu(sub.menu));
        Ok(())
    }

    /// Append a finished menu as a sub-menu
    pub fn add_as_sub_menu(&mut self, menu: Menu) {
        for (service, action) in menu.actions() {
            self.added.insert((service.to_string(), action.to_string()));
        }
        self.menu.items.push(MenuItem::SubMenu(menu));
    }

    /// Finish the menu
    pub fn build(self) -> Menu {
        self.menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{MethodInfo, TypeInfo, TypeRef};

    fn specs() -> FxHashMap<String, Arc<Specification>> {
        let info = TypeInfo::class("Shop.Repository");
        let mut repo = Specification::object(&info);
        for (name, group) in [("FindByName", ""), ("AllCustomers", ""), ("Archive", "Admin")] {
            let method = MethodInfo::new(name, TypeRef::Void);
            let mut action = Specification::action(&method, "Shop.Repository");
            if !group.is_empty() {
                action.add_facet(MemberOrderFacet {
                    sequence: "1".into(),
                    name: group.into(),
                });
            }
            repo.as_object_mut().expect("object").actions.push(Arc::new(action));
        }
        let mut map = FxHashMap::default();
        map.insert("Shop.Repository".to_string(), Arc::new(repo));
        map
    }

    #[test]
    fn test_default_menu_groups_by_member_order_name() {
        let specs = specs();
        let menu = MenuBuilder::default_menu(&specs, "Shop.Repository").expect("menu");
        assert_eq!(menu.items.len(), 3);
        let admin = menu.sub_menu("Admin").expect("admin group");
        assert_eq!(admin.actions(), vec![("Shop.Repository", "Archive")]);
    }

    #[test]
    fn test_custom_menu_with_remaining_actions() {
        let specs = specs();
        let mut builder = MenuBuilder::new(&specs, "Shop.Repository", "Customers");
        builder
            .add_action("AllCustomers", Some("Everyone"))
            .expect("known action");
        builder
            .create_sub_menu("Search", |sub| sub.add_action("FindByName", None))
            .expect("sub-menu");
        builder.add_all_remaining_actions().expect("remaining");
        let menu = builder.build();

        assert_eq!(
            menu.actions(),
            vec![
                ("Shop.Repository", "AllCustomers"),
                ("Shop.Repository", "FindByName"),
                ("Shop.Repository", "Archive"),
            ]
        );
        assert!(matches!(&menu.items[0], MenuItem::Action { name, .. } if name == "Everyone"));
    }

    #[test]
    fn test_unknown_names_are_initialisation_errors() {
        let specs = specs();
        let mut builder = MenuBuilder::new(&specs, "Shop.Repository", "Customers");
        let err = builder.add_action("Missing", None).expect_err("unknown action");
        assert!(err.is_fatal());
        assert!(builder.add_action_from("Shop.Nowhere", "X", None).is_err());
    }
}
