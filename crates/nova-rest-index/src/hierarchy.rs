use std::collections::HashSet;

use crate::model::{ClassInfo, OBJECT};
use crate::TypeIndex;

/// Walks `class` and then each of its superclasses.
///
/// The walk never yields `java.lang.Object` and ends at the first superclass
/// that is not present in the index. A malformed index with a superclass
/// cycle ends the walk at the first repeated class.
pub fn hierarchy<'a>(index: &'a dyn TypeIndex, class: &'a ClassInfo) -> Hierarchy<'a> {
    Hierarchy {
        index,
        next: Some(class),
        seen: HashSet::new(),
    }
}

pub struct Hierarchy<'a> {
    index: &'a dyn TypeIndex,
    next: Option<&'a ClassInfo>,
    seen: HashSet<&'a str>,
}

impl<'a> Iterator for Hierarchy<'a> {
    type Item = &'a ClassInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.seen.insert(current.name.as_str()) {
            return None;
        }

        let index = self.index;
        self.next = current
            .super_name
            .as_deref()
            .filter(|name| *name != OBJECT)
            .and_then(|name| index.class_by_name(name));
        Some(current)
    }
}

impl std::fmt::Debug for Hierarchy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hierarchy")
            .field("next", &self.next.map(|c| c.name.as_str()))
            .finish_non_exhaustive()
    }
}
