//! Descriptor Loading
//!
//! Reads a model descriptor from JSON or TOML and deserializes it into a raw
//! [`Model`]. Default keys are checked here; everything else is left to the
//! validator so one run reports every defect.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::Model;
use crate::checksum::Checksum;
use crate::error::{ModelError, Result};

/// Descriptor syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Toml,
}

impl DescriptorFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A parsed descriptor and where it came from
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    pub model: Model,
    pub path: Option<PathBuf>,
    /// SHA-256 of the descriptor text
    pub checksum: Checksum,
}

/// Parse descriptor text
pub fn load_from_str(content: &str, format: DescriptorFormat) -> Result<Model> {
    let model = match format {
        DescriptorFormat::Json => serde_json::from_str(content)?,
        DescriptorFormat::Toml => toml::from_str(content)?,
    };
    Ok(model)
}

/// Load a descriptor file, choosing the format by extension
pub fn load_descriptor(path: &Path) -> Result<LoadedDescriptor> {
    let format = DescriptorFormat::from_path(path).ok_or_else(|| ModelError::Descriptor {
        path: path.display().to_string(),
        message: "unsupported extension, expected .json or .toml".to_string(),
    })?;

    let content = fs::read_to_string(path)?;
    let model = load_from_str(&content, format).map_err(|e| ModelError::Descriptor {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(
        path = %path.display(),
        classes = model.classes.len(),
        interfaces = model.interfaces.len(),
        "loaded descriptor"
    );

    Ok(LoadedDescriptor {
        model,
        path: Some(path.to_path_buf()),
        checksum: Checksum::from_str(&content),
    })
}

/// Load every descriptor under a directory, sorted by path.
///
/// Each file gets its own result so one bad descriptor does not hide others.
pub fn load_from_directory(dir: &Path) -> Vec<(PathBuf, Result<LoadedDescriptor>)> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| DescriptorFormat::from_path(e.path()).is_some())
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let loaded = load_descriptor(&path);
            (path, loaded)
        })
        .collect()
}
