//! # Classifier Module
//!
//! Decides which destination folder a file belongs in.
//!
//! Without a structure model, files are sorted by a fixed MIME-derived
//! table. With one, the model's folders are tried in order and anything
//! unmatched lands in "Outros". Classification is total: every file gets
//! exactly one label.
//!
//! The built-in [`FileKind`] is always computed, even when a model picks
//! the label, so content transforms can key on what the file actually is.

mod structure;

pub use structure::{FolderRule, StructureModel};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in file categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Pdf,
    Document,
    Other,
}

impl FileKind {
    /// Destination folder name for this category
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Image => "Imagens",
            FileKind::Video => "Vídeos",
            FileKind::Audio => "Áudios",
            FileKind::Pdf => "PDFs",
            FileKind::Document => "Documentos",
            FileKind::Other => OTHER_LABEL,
        }
    }

    /// Map a MIME type onto a category
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_lowercase();
        let top_level = mime.split('/').next().unwrap_or("");

        match top_level {
            "image" => FileKind::Image,
            "video" => FileKind::Video,
            "audio" => FileKind::Audio,
            _ if mime.contains("pdf") => FileKind::Pdf,
            _ if mime.contains("text") || mime.contains("document") => FileKind::Document,
            _ => FileKind::Other,
        }
    }
}

/// Label for files no rule claims
pub const OTHER_LABEL: &str = "Outros";

/// Result of classifying one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// What the file is, from the built-in table
    pub kind: FileKind,
    /// Destination folder name
    pub label: String,
}

/// Classifies files by built-in type rules or a user structure model
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    model: Option<StructureModel>,
}

impl Classifier {
    /// Classifier using only the built-in table
    pub fn new() -> Self {
        Self { model: None }
    }

    /// Classifier that routes by a structure model
    pub fn with_model(model: StructureModel) -> Self {
        Self { model: Some(model) }
    }

    pub fn model(&self) -> Option<&StructureModel> {
        self.model.as_ref()
    }

    /// Built-in kind from the file name's extension alone
    pub fn kind_from_name(file_name: &str) -> Option<FileKind> {
        mime_guess::from_path(file_name)
            .first()
            .map(|mime| FileKind::from_mime(mime.essence_str()))
    }

    /// Classify by name only. Unknown extensions are "Outros".
    pub fn classify_name(&self, file_name: &str) -> Classification {
        let kind = Self::kind_from_name(file_name).unwrap_or(FileKind::Other);
        self.label(file_name, kind)
    }

    /// Classify a file on disk.
    ///
    /// Falls back to sniffing the leading bytes when the extension does
    /// not identify the type.
    pub fn classify(&self, path: &Path) -> Classification {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let kind = Self::kind_from_name(&file_name)
            .or_else(|| Self::sniff(path))
            .unwrap_or(FileKind::Other);

        self.label(&file_name, kind)
    }

    fn sniff(path: &Path) -> Option<FileKind> {
        infer::get_from_path(path)
            .ok()
            .flatten()
            .map(|kind| FileKind::from_mime(kind.mime_type()))
    }

    fn label(&self, file_name: &str, kind: FileKind) -> Classification {
        let label = match &self.model {
            Some(model) => model
                .folder_for(file_name)
                .unwrap_or(OTHER_LABEL)
                .to_string(),
            None => kind.label().to_string(),
        };

        Classification { kind, label }
    }
}
