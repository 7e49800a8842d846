//! Registry-global index of custom types and aspects.
//!
//! Classes are keyed by local name alone: a type and an aspect can never
//! share a name, in the same model or across models. The index also keeps
//! the reverse parent relation so that deletion can be refused while any
//! class still extends the one being removed.

use std::collections::{BTreeMap, BTreeSet};

use cmm_catalog::ClassKind;

use crate::error::{Conflict, NotFound};
use crate::names::QualifiedName;
use crate::types::Property;

/// A stored parent reference.
///
/// Custom parents are held by local name so that a namespace rename of
/// the parent's model never leaves a stale prefix behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// A custom class, by local name.
    Custom(String),
    /// A built-in class of the catalog.
    BuiltIn(QualifiedName),
}

/// One custom class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    /// Immutable local name.
    pub name: String,
    /// Type or aspect.
    pub kind: ClassKind,
    /// Name of the owning model.
    pub owner: String,
    parent: Option<ParentRef>,
    /// Display title.
    pub title: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Own declared properties, in declaration order.
    pub properties: Vec<Property>,
}

impl ClassEntry {
    /// Builds an entry with no properties.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: ClassKind,
        owner: impl Into<String>,
        parent: Option<ParentRef>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: owner.into(),
            parent,
            title: None,
            description: None,
            properties: Vec::new(),
        }
    }

    /// The stored parent reference.
    #[must_use]
    pub fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    /// Name of the custom parent, if the parent is a custom class.
    #[must_use]
    pub fn custom_parent(&self) -> Option<&str> {
        match &self.parent {
            Some(ParentRef::Custom(name)) => Some(name),
            _ => None,
        }
    }

    /// Looks up an own property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Local name → class map with reverse parent links.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    classes: BTreeMap<String, ClassEntry>,
    children: BTreeMap<String, BTreeSet<String>>,
    by_model: BTreeMap<String, BTreeSet<String>>,
}

impl ClassIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if the index holds no class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Checks that `name` is not used by any class.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict::DuplicateClassName`] naming the current owner.
    pub fn check_free(&self, name: &str) -> Result<(), Conflict> {
        match self.classes.get(name) {
            Some(existing) => Err(Conflict::DuplicateClassName {
                name: name.to_owned(),
                owner: existing.owner.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Inserts a new class.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict::DuplicateClassName`] if the local name is taken
    /// by a class of either kind in any model.
    pub fn insert(&mut self, entry: ClassEntry) -> Result<(), Conflict> {
        self.check_free(&entry.name)?;
        if let Some(parent) = entry.custom_parent() {
            self.children
                .entry(parent.to_owned())
                .or_default()
                .insert(entry.name.clone());
        }
        self.by_model
            .entry(entry.owner.clone())
            .or_default()
            .insert(entry.name.clone());
        self.classes.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Returns a class by local name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    /// Returns a class by local name for in-place edits of its
    /// descriptive fields and properties. Use [`set_parent`](Self::set_parent)
    /// to change the parent.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassEntry> {
        self.classes.get_mut(name)
    }

    /// Replaces a class's parent, keeping the reverse links in step.
    /// Returns the previous parent.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::ClassName`] if `name` is not indexed.
    pub fn set_parent(
        &mut self,
        name: &str,
        parent: Option<ParentRef>,
    ) -> Result<Option<ParentRef>, NotFound> {
        let entry = self
            .classes
            .get_mut(name)
            .ok_or_else(|| NotFound::ClassName(name.to_owned()))?;
        let old = std::mem::replace(&mut entry.parent, parent);
        let new_custom = entry.custom_parent().map(str::to_owned);

        if let Some(ParentRef::Custom(old_parent)) = &old {
            self.unlink_child(old_parent, name);
        }
        if let Some(new_parent) = new_custom {
            self.children
                .entry(new_parent)
                .or_default()
                .insert(name.to_owned());
        }
        Ok(old)
    }

    fn unlink_child(&mut self, parent: &str, child: &str) {
        if let Some(set) = self.children.get_mut(parent) {
            set.remove(child);
            if set.is_empty() {
                self.children.remove(parent);
            }
        }
    }

    /// Removes a class that no other class extends.
    ///
    /// # Errors
    ///
    /// - [`NotFound::ClassName`] if `name` is not indexed.
    /// - [`Conflict::HasDependents`] if any class, in any model, has it as
    ///   parent.
    pub fn remove(&mut self, name: &str) -> crate::Result<ClassEntry> {
        if !self.classes.contains_key(name) {
            return Err(NotFound::ClassName(name.to_owned()).into());
        }
        if let Some(dependent) = self.children_of(name).next() {
            return Err(Conflict::HasDependents {
                class: name.to_owned(),
                dependent: dependent.to_owned(),
            }
            .into());
        }
        self.detach(name)
            .ok_or_else(|| NotFound::ClassName(name.to_owned()).into())
    }

    /// Removes every class of `model`. Children outside the model must
    /// have been ruled out by the caller.
    pub fn remove_all_of(&mut self, model: &str) -> Vec<ClassEntry> {
        let names = self.by_model.remove(model).unwrap_or_default();
        let removed: Vec<ClassEntry> = names.iter().filter_map(|n| self.detach(n)).collect();
        for name in &names {
            self.children.remove(name);
        }
        removed
    }

    fn detach(&mut self, name: &str) -> Option<ClassEntry> {
        let entry = self.classes.remove(name)?;
        if let Some(parent) = entry.custom_parent() {
            let parent = parent.to_owned();
            self.unlink_child(&parent, name);
        }
        if let Some(set) = self.by_model.get_mut(&entry.owner) {
            set.remove(name);
            if set.is_empty() {
                self.by_model.remove(&entry.owner);
            }
        }
        Some(entry)
    }

    /// Names of classes whose parent is `name`.
    pub fn children_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.children
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Classes owned by `model`, ordered by name.
    pub fn classes_of<'a>(&'a self, model: &str) -> impl Iterator<Item = &'a ClassEntry> + 'a {
        self.by_model
            .get(model)
            .into_iter()
            .flat_map(move |set| set.iter().filter_map(|n| self.classes.get(n)))
    }

    /// All classes ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.values()
    }

    /// Walks the custom parent chain of `name`, nearest first. Stops at
    /// the first built-in parent.
    #[must_use]
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(name).and_then(ClassEntry::custom_parent);
        while let Some(parent) = current {
            if chain.contains(&parent) || parent == name {
                break;
            }
            chain.push(parent);
            current = self.classes.get(parent).and_then(ClassEntry::custom_parent);
        }
        chain
    }
}
