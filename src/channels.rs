//! Texture channel resolution.
//!
//! Each referenced `iChannelN` with a non-`none` selection gets a sampler
//! uniform, a `<MaterialTexture>` binding at texture slot N and, for newly
//! requested textures, one `<Bitmap>` resource per distinct name.

use std::collections::HashSet;

use crate::context::{CHANNEL_COUNT, ChannelBinding, ChannelSelections, ChannelSource};

pub const FEEDBACK_TEXTURE: &str = "FeedbackMaterialTexture";
pub const STATIC_BITMAP: &str = "Bitmap1";
pub const NEW_TEXTURE_SIZE: u32 = 256;

/// Declarations from the older single-texture template; the dynamic channel
/// uniforms replace them.
const LEGACY_CHANNEL_LINES: [&str; 4] = [
    "uniform sampler2D tex1;",
    "uniform sampler2D tex2;",
    "#define iChannel0 tex1",
    "#define iChannel1 tex2",
];

/// XML fragments produced for the resolved channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFragments {
    pub bindings: Vec<ChannelBinding>,
    /// `<MaterialTexture>` entries for the canvas material.
    pub material_textures: String,
    /// `<Bitmap>` resources to append to `<Content>`.
    pub new_resources: String,
}

pub fn new_texture_name(channel: usize) -> String {
    format!("Bitmap{}_custom", channel + 1)
}

fn resource_name(channel: usize, source: ChannelSource) -> Option<String> {
    match source {
        ChannelSource::None => None,
        ChannelSource::Feedback => Some(FEEDBACK_TEXTURE.to_string()),
        ChannelSource::Bitmap1 => Some(STATIC_BITMAP.to_string()),
        ChannelSource::NewTexture => Some(new_texture_name(channel)),
    }
}

pub fn resolve_channels(
    referenced: [bool; CHANNEL_COUNT],
    selections: &ChannelSelections,
) -> ChannelFragments {
    let mut out = ChannelFragments::default();
    let mut created: HashSet<String> = HashSet::new();

    for (i, _) in referenced.iter().enumerate().filter(|(_, r)| **r) {
        let source = selections.get(i);
        let Some(resource) = resource_name(i, source) else {
            continue;
        };
        let binding = ChannelBinding {
            channel_index: i,
            source,
            texture_resource_name: resource,
        };

        out.material_textures.push_str(&format!(
            "        <MaterialTexture Name=\"{}\" Texture=\"{}\" TexCoords=\"1\" TextureSlot=\"{i}\"/>\n",
            binding.uniform_name(),
            binding.texture_resource_name,
        ));
        if source == ChannelSource::NewTexture
            && created.insert(binding.texture_resource_name.clone())
        {
            log::debug!("creating bitmap resource {}", binding.texture_resource_name);
            out.new_resources.push_str(&format!(
                "    <Bitmap Name=\"{}\" Width=\"{NEW_TEXTURE_SIZE}\" Height=\"{NEW_TEXTURE_SIZE}\"><Producers><BitmapCells CellStyle=\"5\"/></Producers></Bitmap>\n",
                binding.texture_resource_name,
            ));
        }
        out.bindings.push(binding);
    }
    out
}

/// Remove legacy sampler declarations and alias defines, together with the
/// whitespace that follows each.
pub fn strip_legacy_channel_lines(text: &str) -> String {
    let mut out = text.to_string();
    for needle in LEGACY_CHANNEL_LINES {
        out = remove_with_trailing_whitespace(&out, needle);
    }
    out
}

fn remove_with_trailing_whitespace(text: &str, needle: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(needle) {
        out.push_str(&rest[..pos]);
        rest = rest[pos + needle.len()..].trim_start();
    }
    out.push_str(rest);
    out
}
