//! Ownership tree of live actors.
//!
//! Parents are held as ids, never as actors, so a child can address its
//! parent without keeping it alive.

use crate::actor::RuntimeError;
use crate::core::{ActorId, ActorRef, ActorStatus};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Entry {
    actor: ActorRef,
    parent: Option<ActorId>,
    children: BTreeMap<String, ActorId>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<ActorId, Entry>,
}

impl Registry {
    pub fn register_root(&mut self, actor: ActorRef) {
        self.entries.insert(
            actor.id(),
            Entry {
                actor,
                parent: None,
                children: BTreeMap::new(),
            },
        );
    }

    /// Register `child` under `parent`. Names are unique among live children.
    pub fn register(&mut self, parent: ActorId, child: ActorRef) -> Result<(), RuntimeError> {
        let entry = self
            .entries
            .get_mut(&parent)
            .ok_or_else(|| RuntimeError::NotRunning {
                actor: parent.to_string(),
                status: ActorStatus::Stopped,
            })?;
        if entry.children.contains_key(child.name()) {
            return Err(RuntimeError::DuplicateChild {
                parent: entry.actor.name().to_string(),
                name: child.name().to_string(),
            });
        }
        entry.children.insert(child.name().to_string(), child.id());
        self.entries.insert(
            child.id(),
            Entry {
                actor: child,
                parent: Some(parent),
                children: BTreeMap::new(),
            },
        );
        Ok(())
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorRef> {
        self.entries.get(&id).map(|entry| &entry.actor)
    }

    pub fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.entries.get(&id).and_then(|entry| entry.parent)
    }

    pub fn child(&self, parent: ActorId, name: &str) -> Option<ActorId> {
        self.entries
            .get(&parent)
            .and_then(|entry| entry.children.get(name).copied())
    }

    /// Live children, ordered by name.
    pub fn children(&self, id: ActorId) -> Vec<ActorRef> {
        self.entries
            .get(&id)
            .map(|entry| {
                entry
                    .children
                    .values()
                    .filter_map(|child| self.actor(*child).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Unregister `id` and its descendants. Returns them deepest first, so
    /// children are always listed before their parent.
    pub fn remove_subtree(&mut self, id: ActorId) -> Vec<ActorRef> {
        let mut removed = Vec::new();
        self.collect_post_order(id, &mut removed);
        let name = self.actor(id).map(|actor| actor.name().to_string());
        if let (Some(parent), Some(name)) = (self.parent(id), name) {
            if let Some(entry) = self.entries.get_mut(&parent) {
                entry.children.remove(&name);
            }
        }
        for actor in &removed {
            self.entries.remove(&actor.id());
        }
        removed
    }

    /// Unregister every descendant of `id`, keeping `id` itself.
    pub fn remove_descendants(&mut self, id: ActorId) -> Vec<ActorRef> {
        let children: Vec<ActorId> = self
            .entries
            .get(&id)
            .map(|entry| entry.children.values().copied().collect())
            .unwrap_or_default();
        children
            .into_iter()
            .flat_map(|child| self.remove_subtree(child))
            .collect()
    }

    fn collect_post_order(&self, id: ActorId, out: &mut Vec<ActorRef>) {
        let Some(entry) = self.entries.get(&id) else {
            return;
        };
        for child in entry.children.values() {
            self.collect_post_order(*child, out);
        }
        out.push(entry.actor.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> (Registry, ActorRef, ActorRef, ActorRef) {
        let mut registry = Registry::default();
        let root = ActorRef::new("game");
        let child = ActorRef::new("player");
        let grandchild = ActorRef::new("helper");
        registry.register_root(root.clone());
        registry.register(root.id(), child.clone()).unwrap();
        registry.register(child.id(), grandchild.clone()).unwrap();
        (registry, root, child, grandchild)
    }

    #[test]
    fn looks_up_children_by_name_and_parents_by_id() {
        let (registry, root, child, grandchild) = family();

        assert_eq!(registry.child(root.id(), "player"), Some(child.id()));
        assert_eq!(registry.parent(grandchild.id()), Some(child.id()));
        assert_eq!(registry.parent(root.id()), None);
        assert_eq!(registry.children(root.id()), vec![child]);
    }

    #[test]
    fn duplicate_names_are_rejected_per_parent() {
        let (mut registry, root, child, _) = family();

        let result = registry.register(root.id(), ActorRef::new("player"));
        assert!(matches!(result, Err(RuntimeError::DuplicateChild { .. })));

        // the same name under another parent is fine
        assert!(registry.register(child.id(), ActorRef::new("player")).is_ok());
        assert!(registry.contains(child.id()));
    }

    #[test]
    fn removing_a_subtree_lists_descendants_first() {
        let (mut registry, root, child, grandchild) = family();

        let removed = registry.remove_subtree(child.id());

        assert_eq!(removed, vec![grandchild.clone(), child.clone()]);
        assert!(!registry.contains(grandchild.id()));
        assert_eq!(registry.child(root.id(), "player"), None);
        // the name is free again
        assert!(registry.register(root.id(), ActorRef::new("player")).is_ok());
    }

    #[test]
    fn removing_descendants_keeps_the_root() {
        let (mut registry, root, _, _) = family();

        let removed = registry.remove_descendants(root.id());

        assert_eq!(removed.len(), 2);
        assert!(registry.contains(root.id()));
        assert!(registry.children(root.id()).is_empty());
    }
}
