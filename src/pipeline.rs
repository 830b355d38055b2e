//! Conversion coordinator.
//!
//! Extraction, channel resolution and encoding run before the template is
//! needed; the only await point is template retrieval. A retrieval failure
//! aborts the conversion with no document.

use std::fmt;

use anyhow::Result;

use crate::{
    channels::{ChannelFragments, resolve_channels, strip_legacy_channel_lines},
    context::{ChannelSelections, ConversionContext, DEFAULT_AUTHOR, DEFAULT_TITLE},
    diagnostics::Diagnostics,
    encoder::{EncodedParameters, encode_parameters},
    extract::{extract_source, referenced_channels, rewrite_texture_calls},
    source::TemplateSource,
    template::{ProjectFragments, inject, patch::PatchReport},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: String,
    pub channels: ChannelSelections,
    pub default_title: String,
    pub default_author: String,
}

impl ConversionRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            channels: ChannelSelections::default(),
            default_title: DEFAULT_TITLE.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_channels(mut self, channels: ChannelSelections) -> Self {
        self.channels = channels;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: String,
    pub context: ConversionContext,
    pub encoded: EncodedParameters,
    pub report: PatchReport,
    pub diagnostics: Diagnostics,
}

impl Conversion {
    /// `"<author> <title>.zgeproj"`, with path separators replaced.
    pub fn suggested_file_name(&self) -> String {
        let name = format!("{} {}.zgeproj", self.context.author, self.context.title);
        name.chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect()
    }
}

/// Fatal conversion error together with the diagnostics gathered so far.
#[derive(Debug)]
pub struct ConversionFailure {
    pub error: anyhow::Error,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error during conversion: {:#}", self.error)
    }
}

impl std::error::Error for ConversionFailure {}

/// Template-independent stages of a conversion.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub context: ConversionContext,
    pub channels: ChannelFragments,
    pub encoded: EncodedParameters,
    pub diagnostics: Diagnostics,
}

pub fn prepare(request: &ConversionRequest) -> Result<Prepared> {
    let mut diagnostics = Diagnostics::new();

    let processed = rewrite_texture_calls(&request.source);
    let mut context = extract_source(
        &processed,
        &request.default_title,
        &request.default_author,
        &mut diagnostics,
    );

    let channels = resolve_channels(referenced_channels(&request.source), &request.channels);
    context.shader_body = strip_legacy_channel_lines(&context.shader_body);
    context.channels = channels.bindings.clone();

    let encoded = encode_parameters(&context, &mut diagnostics)?;
    Ok(Prepared {
        context,
        channels,
        encoded,
        diagnostics,
    })
}

fn finish(prepared: Prepared, template: &str) -> Conversion {
    let Prepared {
        context,
        channels,
        encoded,
        mut diagnostics,
    } = prepared;

    let fragments = ProjectFragments::new(&context, &channels, &encoded);
    let (document, report) = inject(template, &fragments);
    log::info!(
        "converted {:?} by {:?}: {} parameter slot(s), {} channel(s), {} template step(s) skipped",
        context.title,
        context.author,
        context.persisted_len(),
        context.channels.len(),
        report.skipped.len()
    );
    diagnostics.info("Operation completed!");

    Conversion {
        document,
        context,
        encoded,
        report,
        diagnostics,
    }
}

fn fail(error: anyhow::Error, mut diagnostics: Diagnostics) -> ConversionFailure {
    diagnostics.error(format!("Error during conversion: {error:#}"));
    ConversionFailure { error, diagnostics }
}

/// Run the whole pipeline against template text the caller already holds.
pub fn convert_with_template(
    request: &ConversionRequest,
    template: &str,
) -> Result<Conversion, ConversionFailure> {
    let prepared = prepare(request).map_err(|e| fail(e, Diagnostics::new()))?;
    Ok(finish(prepared, template))
}

/// Run the whole pipeline, retrieving the template from `source`.
pub async fn convert<S>(request: &ConversionRequest, source: &S) -> Result<Conversion, ConversionFailure>
where
    S: TemplateSource + ?Sized,
{
    let prepared = prepare(request).map_err(|e| fail(e, Diagnostics::new()))?;
    match source.fetch().await {
        Ok(template) => Ok(finish(prepared, &template)),
        Err(e) => Err(fail(e, prepared.diagnostics)),
    }
}
