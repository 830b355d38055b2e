//! Template document retrieval.

use std::{future::Future, path::PathBuf};

use anyhow::{Context, Result, anyhow, bail};

/// The project template shipped with the crate.
pub const BUNDLED_TEMPLATE: &str = include_str!("../assets/templates/basic.zgeproj");

/// Anything that can produce the template document text.
pub trait TemplateSource {
    fn fetch(&self) -> impl Future<Output = Result<String>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateLocation {
    #[default]
    Bundled,
    File(PathBuf),
    Url(String),
}

impl TemplateLocation {
    /// `http(s)://` selects a URL; empty or `bundled` the built-in template; anything else is a path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.is_empty() || location.eq_ignore_ascii_case("bundled") {
            TemplateLocation::Bundled
        } else if location.starts_with("http://") || location.starts_with("https://") {
            TemplateLocation::Url(location.to_string())
        } else {
            TemplateLocation::File(PathBuf::from(location))
        }
    }
}

impl TemplateSource for TemplateLocation {
    async fn fetch(&self) -> Result<String> {
        match self {
            TemplateLocation::Bundled => Ok(BUNDLED_TEMPLATE.to_string()),
            TemplateLocation::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read template {}", path.display())),
            TemplateLocation::Url(url) => fetch_url(url).await,
        }
    }
}

/// Already-retrieved template text.
impl TemplateSource for str {
    async fn fetch(&self) -> Result<String> {
        Ok(self.to_string())
    }
}

async fn fetch_url(url: &str) -> Result<String> {
    log::info!("fetching template from {url}");
    let response = ehttp::fetch_async(ehttp::Request::get(url))
        .await
        .map_err(|e| anyhow!("failed to fetch template {url}: {e}"))?;
    if !response.ok {
        bail!(
            "Network response was not ok: {} {} ({url})",
            response.status,
            response.status_text
        );
    }
    String::from_utf8(response.bytes).with_context(|| format!("template at {url} is not valid UTF-8"))
}
