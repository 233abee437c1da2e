use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{IndexError, Result};
use crate::model::ClassInfo;
use crate::TypeIndex;

/// Simple in-memory index for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    classes: BTreeMap<String, ClassInfo>,
}

/// On-disk JSON shape: `{ "classes": [ ... ] }`.
#[derive(Debug, Default, Deserialize)]
struct IndexFile {
    #[serde(default)]
    classes: Vec<ClassInfo>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index, rejecting duplicate class names.
    pub fn from_classes(classes: impl IntoIterator<Item = ClassInfo>) -> Result<Self> {
        let mut index = Self::new();
        for class in classes {
            if index.classes.contains_key(&class.name) {
                return Err(IndexError::DuplicateClass(class.name));
            }
            index.classes.insert(class.name.clone(), class);
        }
        Ok(index)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: IndexFile = serde_json::from_str(text)?;
        Self::from_classes(file.classes)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Inserts `class`, returning the previous entry with the same name.
    pub fn insert(&mut self, class: ClassInfo) -> Option<ClassInfo> {
        self.classes.insert(class.name.clone(), class)
    }

    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }
}

impl TypeIndex for MemoryIndex {
    fn class_by_name(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }
}
