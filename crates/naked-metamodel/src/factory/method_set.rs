//! Per-type method bookkeeping during introspection
//!
//! Every method visible on a type starts `Unclassified`. Factories and the
//! reflector move it to exactly one terminal state; a method in a terminal
//! state never changes again, so a getter attributed to a property can never
//! reappear as an action.

use rustc_hash::FxHashMap;

use crate::reflect::{MethodId, MethodInfo};

/// Classification of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodState {
    /// Not yet claimed
    Unclassified,
    /// Consumed by a factory or filtered out
    Removed,
    /// Accessor of a property or collection
    Property,
    /// Introspected as an action
    Action,
    /// Lifecycle callback
    Callback,
}

/// Side channel through which factories consume methods
pub trait MethodRemover {
    /// Mark a method removed; removing a removed method is a no-op
    fn remove_method(&mut self, method: &MethodId);

    /// Mark several methods removed
    fn remove_methods(&mut self, methods: &[MethodId]) {
        for method in methods {
            self.remove_method(method);
        }
    }

    /// Move an unclassified method to a terminal state
    fn claim(&mut self, method: &MethodId, state: MethodState) -> bool;

    /// Current state, if the method is known
    fn state_of(&self, method: &MethodId) -> Option<MethodState>;
}

/// Method state machine for one type
#[derive(Debug, Clone, Default)]
pub struct MethodSet {
    methods: Vec<MethodInfo>,
    states: FxHashMap<MethodId, MethodState>,
    removed: Vec<MethodId>,
}

impl MethodSet {
    /// Track the given methods, all unclassified
    pub fn new(methods: Vec<MethodInfo>) -> Self {
        let states = methods
            .iter()
            .map(|m| (m.id(), MethodState::Unclassified))
            .collect();
        Self {
            methods,
            states,
            removed: Vec::new(),
        }
    }

    /// Every tracked method
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Methods still unclassified, in declaration order
    pub fn unclassified(&self) -> Vec<MethodInfo> {
        self.methods
            .iter()
            .filter(|m| self.states.get(&m.id()) == Some(&MethodState::Unclassified))
            .cloned()
            .collect()
    }

    /// Methods removed so far, in removal order
    pub fn removed(&self) -> &[MethodId] {
        &self.removed
    }

    /// Whether a method is still unclassified
    pub fn is_unclassified(&self, method: &MethodId) -> bool {
        self.states.get(method) == Some(&MethodState::Unclassified)
    }

    /// Methods in a given state
    pub fn in_state(&self, state: MethodState) -> Vec<MethodId> {
        self.methods
            .iter()
            .map(MethodInfo::id)
            .filter(|id| self.states.get(id) == Some(&state))
            .collect()
    }
}

impl MethodRemover for MethodSet {
    fn remove_method(&mut self, method: &MethodId) {
        match self.states.get(method).copied() {
            Some(MethodState::Unclassified) => {
                log::debug!("removing method {}", method);
                self.states.insert(method.clone(), MethodState::Removed);
                self.removed.push(method.clone());
            }
            Some(MethodState::Removed) | None => {}
            Some(state) => {
                log::debug!("method {} already classified as {:?}, not removed", method, state);
            }
        }
    }

    fn claim(&mut self, method: &MethodId, state: MethodState) -> bool {
        if state == MethodState::Unclassified {
            return false;
        }
        if state == MethodState::Removed {
            let before = self.removed.len();
            self.remove_method(method);
            return self.removed.len() > before;
        }
        match self.states.get_mut(method) {
            Some(current) if *current == MethodState::Unclassified => {
                *current = state;
                true
            }
            _ => false,
        }
    }

    fn state_of(&self, method: &MethodId) -> Option<MethodState> {
        self.states.get(method).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeRef;

    fn method(name: &str) -> MethodInfo {
        let mut m = MethodInfo::new(name, TypeRef::Void);
        m.declaring_type = "Shop.Customer".into();
        m
    }

    #[test]
    fn test_remove_is_recorded_once() {
        let mut set = MethodSet::new(vec![method("Title"), method("Order")]);
        let title = method("Title").id();
        set.remove_method(&title);
        set.remove_method(&title);
        assert_eq!(set.removed(), &[title.clone()]);
        assert_eq!(set.unclassified().len(), 1);
        assert_eq!(set.state_of(&title), Some(MethodState::Removed));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut set = MethodSet::new(vec![method("Order")]);
        let order = method("Order").id();
        assert!(set.claim(&order, MethodState::Action));
        assert!(!set.claim(&order, MethodState::Callback));
        set.remove_method(&order);
        assert_eq!(set.state_of(&order), Some(MethodState::Action));
        assert!(set.removed().is_empty());
    }

    #[test]
    fn test_removed_cannot_be_claimed() {
        let mut set = MethodSet::new(vec![method("Created")]);
        let created = method("Created").id();
        assert!(set.claim(&created, MethodState::Removed));
        assert!(!set.claim(&created, MethodState::Action));
        assert_eq!(set.in_state(MethodState::Removed), vec![created]);
    }
}
