//! Field selection: base and per-association include/exclude lists.

use indexmap::{IndexMap, IndexSet};

use quarry_core::{Error, Field, Result, SelectionHint};

/// Include/exclude lists. Nested maps keep first-reference order of
/// associations; base sets keep insertion order of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub include: IndexSet<String>,
    pub exclude: IndexSet<String>,
    pub include_nested: IndexMap<String, IndexSet<String>>,
    pub exclude_nested: IndexMap<String, IndexSet<String>>,
}

/// Whether a field may be read from hydrated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Allowed,
    NotIncluded,
    Excluded,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
            && self.exclude.is_empty()
            && self.include_nested.is_empty()
            && self.exclude_nested.is_empty()
    }

    /// An include list exists anywhere (base or nested).
    pub fn has_includes(&self) -> bool {
        !self.include.is_empty() || !self.include_nested.is_empty()
    }

    pub(crate) fn add_include(&mut self, field: &Field) {
        match field.assoc() {
            Some(assoc) => {
                self.include_nested
                    .entry(assoc.to_owned())
                    .or_default()
                    .insert(field.name().to_owned());
            }
            None => {
                self.include.insert(field.name().to_owned());
            }
        }
    }

    pub(crate) fn add_exclude(&mut self, field: &Field) {
        match field.assoc() {
            Some(assoc) => {
                self.exclude_nested
                    .entry(assoc.to_owned())
                    .or_default()
                    .insert(field.name().to_owned());
            }
            None => {
                self.exclude.insert(field.name().to_owned());
            }
        }
    }

    pub(crate) fn clear_includes(&mut self) {
        self.include.clear();
        self.include_nested.clear();
    }

    /// Base includes minus base excludes, insertion order.
    pub fn effective_base(&self) -> Vec<&str> {
        self.include
            .iter()
            .filter(|f| !self.exclude.contains(*f))
            .map(String::as_str)
            .collect()
    }

    /// Nested includes for `assoc` minus its excludes, sorted by name.
    pub fn effective_nested(&self, assoc: &str) -> Vec<&str> {
        let excluded = self.exclude_nested.get(assoc);
        let mut fields: Vec<&str> = self
            .include_nested
            .get(assoc)
            .into_iter()
            .flatten()
            .filter(|f| !excluded.is_some_and(|ex| ex.contains(*f)))
            .map(String::as_str)
            .collect();
        fields.sort_unstable();
        fields
    }

    /// Classify a field against include-minus-exclude semantics.
    ///
    /// With no include list for the field's scope, everything not excluded
    /// is allowed.
    pub fn access(&self, field: &Field) -> FieldAccess {
        let (include, exclude) = match field.assoc() {
            Some(assoc) => (self.include_nested.get(assoc), self.exclude_nested.get(assoc)),
            None => (
                Some(&self.include).filter(|s| !s.is_empty()),
                Some(&self.exclude),
            ),
        };
        if exclude.is_some_and(|ex| ex.contains(field.name())) {
            return FieldAccess::Excluded;
        }
        match include {
            Some(inc) if !inc.contains(field.name()) => FieldAccess::NotIncluded,
            _ => FieldAccess::Allowed,
        }
    }

    /// Fail with a fix-it hint when `field` cannot be read.
    pub fn ensure_readable(&self, field: &Field) -> Result<()> {
        let hint = match self.access(field) {
            FieldAccess::Allowed => return Ok(()),
            FieldAccess::Excluded => SelectionHint::RemoveExclude(field.to_string()),
            FieldAccess::NotIncluded => SelectionHint::Reselect(self.reselect_with(field)),
        };
        Err(Error::SelectionConflict {
            field: field.to_string(),
            hint,
        })
    }

    /// Current effective includes plus `field`, in selection order.
    fn reselect_with(&self, field: &Field) -> Vec<String> {
        let mut fields: Vec<String> = self
            .include_nested
            .keys()
            .flat_map(|assoc| {
                self.effective_nested(assoc)
                    .into_iter()
                    .map(move |f| format!("{assoc}.{f}"))
            })
            .collect();
        fields.extend(self.effective_base().into_iter().map(String::from));
        let wanted = field.to_string();
        if !fields.contains(&wanted) {
            fields.push(wanted);
        }
        fields
    }
}
