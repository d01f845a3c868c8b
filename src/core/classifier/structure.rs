//! User-supplied structure models.
//!
//! A structure model maps destination folder names to file-name suffix
//! patterns. Folder order is significant: the first folder with a
//! matching pattern wins, so overlapping patterns are resolved by the
//! order the user wrote them in.

use crate::error::SetupError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// One destination folder and the suffixes routed into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRule {
    pub folder: String,
    pub patterns: Vec<String>,
}

impl FolderRule {
    /// Case-insensitive suffix match against a file name
    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| name.ends_with(&normalize_pattern(pattern)))
    }
}

/// Ordered mapping of folder name to suffix patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureModel {
    rules: Vec<FolderRule>,
}

impl StructureModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a folder. Insertion order is the match order.
    pub fn with_folder<I, S>(mut self, folder: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(FolderRule {
            folder: folder.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn rules(&self) -> &[FolderRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First folder whose patterns match the file name
    pub fn folder_for(&self, file_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(file_name))
            .map(|rule| rule.folder.as_str())
    }

    /// Parse an inline JSON object, keeping the document's key order
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| SetupError::InvalidStructureModel {
                reason: e.to_string(),
            })?;
        model.validate()?;
        Ok(model)
    }

    /// Load an inline JSON model from a file
    pub fn from_json_file(path: &Path) -> Result<Self, SetupError> {
        let content =
            fs::read_to_string(path).map_err(|e| SetupError::InvalidStructureModel {
                reason: format!("cannot read {}: {}", path.display(), e),
            })?;
        Self::from_json(&content)
    }

    /// Infer a model from a template directory.
    ///
    /// Each immediate subfolder (sorted by name) becomes a folder whose
    /// patterns are the distinct extensions of the files found inside it.
    pub fn from_template_dir(root: &Path) -> Result<Self, SetupError> {
        let entries = fs::read_dir(root).map_err(|e| SetupError::InvalidStructureModel {
            reason: format!("cannot read template folder {}: {}", root.display(), e),
        })?;

        let mut folders: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .collect();
        folders.sort_by_key(|e| e.file_name());

        let mut model = Self::new();
        for folder in folders {
            let name = folder.file_name().to_string_lossy().to_string();
            let extensions: BTreeSet<String> = WalkDir::new(folder.path())
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| {
                    e.path()
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| format!("*.{}", ext.to_lowercase()))
                })
                .collect();

            model = model.with_folder(name, extensions);
        }

        model.validate()?;
        Ok(model)
    }

    /// Reject models that cannot produce a sane destination layout
    pub fn validate(&self) -> Result<(), SetupError> {
        let invalid = |reason: String| SetupError::InvalidStructureModel { reason };

        if self.rules.is_empty() {
            return Err(invalid("the model has no folders".to_string()));
        }

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            let folder = rule.folder.trim();
            if folder.is_empty() || folder == "." || folder == ".." {
                return Err(invalid(format!("invalid folder name {:?}", rule.folder)));
            }
            if folder.contains('/') || folder.contains('\\') {
                return Err(invalid(format!(
                    "folder name {:?} must not contain path separators",
                    rule.folder
                )));
            }
            if !seen.insert(folder.to_lowercase()) {
                return Err(invalid(format!("folder {:?} is listed twice", rule.folder)));
            }
            if let Some(empty) = rule.patterns.iter().find(|p| normalize_pattern(p).is_empty()) {
                return Err(invalid(format!(
                    "folder {:?} has an empty pattern {:?}",
                    rule.folder, empty
                )));
            }
        }

        Ok(())
    }
}

/// `"*.TXT"` and `".txt"` both mean "ends with .txt"
fn normalize_pattern(pattern: &str) -> String {
    pattern.trim().trim_start_matches('*').to_lowercase()
}

impl Serialize for StructureModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.folder, &rule.patterns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StructureModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModelVisitor;

        impl<'de> Visitor<'de> for ModelVisitor {
            type Value = StructureModel;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping folder names to lists of suffix patterns")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut model = StructureModel::new();
                while let Some((folder, patterns)) = access.next_entry::<String, Vec<String>>()? {
                    model.rules.push(FolderRule { folder, patterns });
                }
                Ok(model)
            }
        }

        deserializer.deserialize_map(ModelVisitor)
    }
}
