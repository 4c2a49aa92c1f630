//! Configuration management for modelgen
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (modelgen.toml, .modelgen.toml, config/modelgen.toml)
//! - The user config directory
//! - Environment variables (MODELGEN__*)
//!
//! ## Example config file (modelgen.toml):
//! ```toml
//! [generation]
//! output_directory = "target/generated-sources"
//! backends = ["java", "manifest"]
//! package_with_version = false
//! encoding = "UTF-8"
//!
//! [generation.options]
//! style = "modello"
//!
//! [validation]
//! external_types = ["java.util.UUID"]
//! fail_on_warnings = false
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::codegen::GenerationConfig;
use crate::validate::ValidationOptions;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub generation: GenerationSection,

    #[serde(default)]
    pub validation: ValidationSection,

    #[serde(default)]
    pub output: OutputSection,
}

/// Backend selection and options passed to backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Where artifacts are written
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Backends run when none is named on the command line
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,

    #[serde(default)]
    pub package_with_version: bool,

    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Extra backend options, passed through untouched
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSection {
    /// Field types accepted without a declaration in the model
    #[serde(default)]
    pub external_types: Vec<String>,

    /// Treat validation warnings as failures
    #[serde(default)]
    pub fail_on_warnings: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    /// Report format on stdout
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("generated")
}

fn default_backends() -> Vec<String> {
    vec!["java".to_string()]
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            backends: default_backends(),
            package_with_version: false,
            encoding: default_encoding(),
            options: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["modelgen.toml", ".modelgen.toml", "config/modelgen.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "modelgen", "modelgen") {
            let user_config = dirs.config_dir().join("modelgen.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MODELGEN__GENERATION__ENCODING=UTF-8 and so on
        builder = builder.add_source(
            Environment::with_prefix("MODELGEN")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Output directory, relative paths resolved against the working directory
    pub fn output_root(&self) -> PathBuf {
        let dir = &self.generation.output_directory;
        if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(dir)
        }
    }

    /// The option mapping handed to backends
    pub fn to_generation_config(&self) -> GenerationConfig {
        let mut config: GenerationConfig = self.generation.options.clone().into_iter().collect();
        config = config
            .with(
                GenerationConfig::OUTPUT_DIRECTORY,
                self.generation.output_directory.display().to_string(),
            )
            .with(GenerationConfig::ENCODING, self.generation.encoding.clone());
        if self.generation.package_with_version {
            config = config.with(GenerationConfig::PACKAGE_WITH_VERSION, "true");
        }
        config
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::with_external_types(self.validation.external_types.iter().cloned())
    }
}
