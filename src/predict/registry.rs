//! Discovery of model artifacts on disk

use std::path::{Path, PathBuf};

use crate::{ArtifactConfig, Result};

/// Source of selectable model names
pub trait ModelLister {
    /// Model names in display order
    fn list_models(&self) -> Result<Vec<String>>;
}

/// File names in `dir` carrying the artifact `extension`, sorted by name
///
/// Only regular files directly inside `dir` are considered. A directory
/// without matching files yields an empty list.
pub fn list_available_models<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<String>> {
    let extension = extension.trim_start_matches('.');
    let mut names = Vec::new();

    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Lists artifacts in a models directory
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    dir: PathBuf,
    extension: String,
}

impl DirectoryLister {
    pub fn new<P: Into<PathBuf>>(dir: P, extension: &str) -> Self {
        DirectoryLister {
            dir: dir.into(),
            extension: extension.to_string(),
        }
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(&config.models_dir, &config.model_extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ModelLister for DirectoryLister {
    fn list_models(&self) -> Result<Vec<String>> {
        let names = list_available_models(&self.dir, &self.extension)?;
        log::debug!("Found {} models in {}", names.len(), self.dir.display());
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let names = list_available_models(dir.path(), "mpk").unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta.mpk", "alpha.mpk", "notes.txt", "model.mpk.bak", "mpk"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        // Subdirectories are never listed, even with a matching name
        std::fs::create_dir(dir.path().join("nested.mpk")).unwrap();

        let names = list_available_models(dir.path(), ".mpk").unwrap();
        assert_eq!(names, vec!["alpha.mpk".to_string(), "zeta.mpk".to_string()]);

        let lister = DirectoryLister::new(dir.path(), "mpk");
        assert_eq!(lister.list_models().unwrap(), names);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_available_models(dir.path().join("absent"), "mpk").is_err());
    }
}
