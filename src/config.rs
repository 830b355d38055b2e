//! Converter configuration file (JSON).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    context::{ChannelSelections, DEFAULT_AUTHOR, DEFAULT_TITLE},
    pipeline::ConversionRequest,
    source::TemplateLocation,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConverterConfig {
    pub default_title: String,
    pub default_author: String,
    /// Path, `http(s)://` URL, or `bundled`.
    pub template: String,
    pub channels: ChannelSelections,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
            template: "bundled".to_string(),
            channels: ChannelSelections::default(),
        }
    }
}

impl ConverterConfig {
    pub fn template_location(&self) -> TemplateLocation {
        TemplateLocation::parse(&self.template)
    }

    pub fn request(&self, source: impl Into<String>) -> ConversionRequest {
        ConversionRequest {
            source: source.into(),
            channels: self.channels,
            default_title: self.default_title.clone(),
            default_author: self.default_author.clone(),
        }
    }
}

pub fn parse_config(text: &str) -> Result<ConverterConfig> {
    serde_json::from_str(text).context("failed to parse converter config json")
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<ConverterConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read converter config at {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid converter config {}", path.display()))
}
