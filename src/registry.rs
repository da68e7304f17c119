use std::collections::HashMap;

use crate::engine::Engine;

/// Named engine instances for pages hosting several filtered lists.
/// Create one per page view, insert instances as they initialize, and
/// clear the whole thing on navigation.
#[derive(Debug, Default)]
pub struct Registry {
    engines: HashMap<String, Engine>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine under a name, returning any previous holder.
    pub fn insert(&mut self, name: impl Into<String>, engine: Engine) -> Option<Engine> {
        self.engines.insert(name.into(), engine)
    }

    pub fn get(&self, name: &str) -> Option<&Engine> {
        self.engines.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Engine> {
        self.engines.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Engine> {
        self.engines.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Drops every instance; call when the page view goes away.
    pub fn clear(&mut self) {
        self.engines.clear();
    }
}
