//! # Render
//!
//! Turns the manifest templates shipped with the operator into objects ready
//! to be applied.
//!
//! Templates are multi-document YAML files with `{{.Key}}` placeholders. Every
//! placeholder must have a value; an unknown key fails the render instead of
//! producing a half-substituted manifest.

mod address_pool;

pub use address_pool::render_address_pool_config_map;

use crate::config::ControllerConfig;
use kube::api::DynamicObject;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.(\w+)\s*\}\}")
        .expect("Failed to compile placeholder regex - this should never happen")
});

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no value for template key {0}")]
    MissingValue(String),
    #[error("invalid YAML in {file}: {source}")]
    Yaml {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document {index} in {file} is not a Kubernetes object: {reason}")]
    InvalidObject {
        file: String,
        index: usize,
        reason: String,
    },
}

/// Values substituted into manifest templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderData {
    values: BTreeMap<String, String>,
}

impl RenderData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The values the MetalLB manifests use: images and target namespace
    #[must_use]
    pub fn for_config(config: &ControllerConfig) -> Self {
        Self::new()
            .with("ControllerImage", &config.controller_image)
            .with("SpeakerImage", &config.speaker_image)
            .with("NameSpace", &config.namespace)
    }
}

/// Substitute every `{{.Key}}` in `template`.
///
/// # Errors
///
/// [`RenderError::MissingValue`] naming the first key without a value.
pub fn render_template(template: &str, data: &RenderData) -> Result<String, RenderError> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|key| data.get(key).is_none())
    {
        return Err(RenderError::MissingValue(missing));
    }

    Ok(PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            data.get(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned())
}

/// Parse a multi-document YAML stream into objects, skipping empty documents.
///
/// `file` is only used in error messages.
///
/// # Errors
///
/// Returns a [`RenderError`] if a document is not valid YAML or lacks
/// `apiVersion`, `kind` or `metadata`.
pub fn parse_objects(yaml: &str, file: &str) -> Result<Vec<DynamicObject>, RenderError> {
    let mut objects = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let value = serde_json::Value::deserialize(document).map_err(|source| RenderError::Yaml {
            file: file.to_string(),
            source,
        })?;
        if value.is_null() {
            continue;
        }

        let invalid = |reason: String| RenderError::InvalidObject {
            file: file.to_string(),
            index,
            reason,
        };
        let object: DynamicObject =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        match &object.types {
            Some(types) if !types.api_version.is_empty() && !types.kind.is_empty() => {}
            _ => return Err(invalid("missing apiVersion or kind".to_string())),
        }
        objects.push(object);
    }

    Ok(objects)
}

/// Render every `.yaml`/`.yml` file in `dir`, in file name order.
///
/// # Errors
///
/// Returns a [`RenderError`] if the directory or a file cannot be read, or
/// a file fails to render or parse.
pub fn render_dir(dir: &Path, data: &RenderData) -> Result<Vec<DynamicObject>, RenderError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| RenderError::Io { path, source }
    };

    let mut files = std::fs::read_dir(dir)
        .map_err(io_error(dir))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error(dir))?;
    files.retain(|path| {
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
    });
    files.sort();

    let mut objects = Vec::new();
    for path in files {
        let template = std::fs::read_to_string(&path).map_err(io_error(path.as_path()))?;
        let rendered = render_template(&template, data)?;
        let file = path.display().to_string();
        let parsed = parse_objects(&rendered, &file)?;
        debug!("Rendered {} objects from {}", parsed.len(), file);
        objects.extend(parsed);
    }

    Ok(objects)
}
