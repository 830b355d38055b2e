//! Values passed between the conversion stages.

use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

/// Identifier prefix marking a custom parameter declaration.
pub const PARAM_PREFIX: &str = "ZGE";

pub const DEFAULT_TITLE: &str = "ZGEshader";
pub const DEFAULT_AUTHOR: &str = "Shader author";

pub const CHANNEL_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Float,
    Bool,
}

impl ParamKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    /// `[0, 1]` maps to the persisted domain without any arithmetic.
    pub fn is_unit(&self) -> bool {
        self.min == 0.0 && self.max == 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclaredRange {
    Bounds(ParamRange),
    /// A `Range:` marker whose bounds did not parse; holds the text after the marker.
    Malformed(String),
}

/// One custom parameter declared in the shader source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderParameter {
    /// Identifier without the `ZGE` prefix.
    pub id: String,
    pub kind: ParamKind,
    /// Literal initializer text, trimmed.
    pub raw_value: String,
    pub range: Option<DeclaredRange>,
    pub tags: Vec<String>,
}

impl ShaderParameter {
    /// Name of the uniform in the shader and of the variable binding.
    pub fn uniform_name(&self) -> String {
        format!("{PARAM_PREFIX}{}", self.id)
    }

    pub fn bounds(&self) -> Option<ParamRange> {
        match self.range {
            Some(DeclaredRange::Bounds(r)) => Some(r),
            _ => None,
        }
    }
}

/// What a texture channel samples from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelSource {
    #[default]
    None,
    Feedback,
    Bitmap1,
    /// Generated 256x256 bitmap owned by this channel.
    NewTexture,
}

impl FromStr for ChannelSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim().to_ascii_lowercase();
        match t.as_str() {
            "none" | "" => Ok(ChannelSource::None),
            "feedback" => Ok(ChannelSource::Feedback),
            "bitmap1" => Ok(ChannelSource::Bitmap1),
            "new" | "bitmap2_new" | "bitmap3_new" | "bitmap4_new" => Ok(ChannelSource::NewTexture),
            other => Err(anyhow!(
                "unknown channel source: {other} (supported: none, feedback, bitmap1, new)"
            )),
        }
    }
}

impl fmt::Display for ChannelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelSource::None => "none",
            ChannelSource::Feedback => "feedback",
            ChannelSource::Bitmap1 => "bitmap1",
            ChannelSource::NewTexture => "new",
        })
    }
}

impl TryFrom<String> for ChannelSource {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChannelSource> for String {
    fn from(value: ChannelSource) -> Self {
        value.to_string()
    }
}

/// Caller-held selection for each of the four channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[ChannelSource; CHANNEL_COUNT]", into = "[ChannelSource; CHANNEL_COUNT]")]
pub struct ChannelSelections {
    sources: [ChannelSource; CHANNEL_COUNT],
}

impl ChannelSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, channel: usize, source: ChannelSource) -> Result<()> {
        if channel >= CHANNEL_COUNT {
            bail!("channel index {channel} out of range (0..{CHANNEL_COUNT})");
        }
        if channel == 0 && source == ChannelSource::NewTexture {
            bail!("channel 0 cannot create a new texture (only channels 1-3 can)");
        }
        self.sources[channel] = source;
        Ok(())
    }

    pub fn with(mut self, channel: usize, source: ChannelSource) -> Result<Self> {
        self.set(channel, source)?;
        Ok(self)
    }

    pub fn get(&self, channel: usize) -> ChannelSource {
        self.sources.get(channel).copied().unwrap_or_default()
    }

    /// Parse `N=source`, as given on the command line.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let (index, source) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <channel>=<source>, got {assignment:?}"))?;
        let index: usize = index
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid channel index {index:?}: {e}"))?;
        self.set(index, source.parse()?)
    }
}

impl TryFrom<[ChannelSource; CHANNEL_COUNT]> for ChannelSelections {
    type Error = anyhow::Error;

    fn try_from(sources: [ChannelSource; CHANNEL_COUNT]) -> Result<Self> {
        let mut out = Self::default();
        for (i, s) in sources.into_iter().enumerate() {
            out.set(i, s)?;
        }
        Ok(out)
    }
}

impl From<ChannelSelections> for [ChannelSource; CHANNEL_COUNT] {
    fn from(value: ChannelSelections) -> Self {
        value.sources
    }
}

/// A channel that is referenced by the shader and bound to a texture resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub channel_index: usize,
    pub source: ChannelSource,
    pub texture_resource_name: String,
}

impl ChannelBinding {
    pub fn uniform_name(&self) -> String {
        format!("iChannel{}", self.channel_index)
    }
}

/// Everything extracted from one shader source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionContext {
    pub title: String,
    pub author: String,
    pub delta_mode: bool,
    pub parameters: Vec<ShaderParameter>,
    /// User code with declaration/metadata lines and legacy sampler lines removed.
    pub shader_body: String,
    pub channels: Vec<ChannelBinding>,
}

impl ConversionContext {
    pub fn new(default_title: impl Into<String>, default_author: impl Into<String>) -> Self {
        Self {
            title: default_title.into(),
            author: default_author.into(),
            delta_mode: false,
            parameters: Vec::new(),
            shader_body: String::new(),
            channels: Vec::new(),
        }
    }

    /// First persisted slot used by parameters; slot 0 is Speed in delta mode.
    pub fn slot_offset(&self) -> usize {
        usize::from(self.delta_mode)
    }

    /// Size of the persisted `Parameters` array.
    pub fn persisted_len(&self) -> usize {
        self.parameters.len() + self.slot_offset()
    }

    pub fn parameter_uniforms(&self) -> String {
        self.parameters
            .iter()
            .map(|p| format!("uniform float {};\n", p.uniform_name()))
            .collect()
    }

    pub fn channel_uniforms(&self) -> String {
        self.channels
            .iter()
            .map(|c| format!("uniform sampler2D {};\n", c.uniform_name()))
            .collect()
    }

    /// Channel uniforms, then parameter uniforms, then the cleaned user code.
    pub fn assembled_shader(&self) -> String {
        let mut out = self.channel_uniforms();
        out.push_str(&self.parameter_uniforms());
        out.push_str(&self.shader_body);
        out
    }
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_AUTHOR)
    }
}
