//! Parameter and metadata extraction over the shader source.

pub mod declaration;
pub mod metadata;
pub mod params;

use crate::{
    context::{CHANNEL_COUNT, ConversionContext},
    diagnostics::Diagnostics,
};

use self::{
    declaration::parse_declaration,
    metadata::{MetadataMarker, parse_metadata_line},
    params::{ParameterList, parameter_from_declaration},
};

/// Rewrite `texture(` calls to `texture2D(`; identifiers ending in `texture` are left alone.
pub fn rewrite_texture_calls(source: &str) -> String {
    const NEEDLE: &str = "texture(";
    let mut out = String::with_capacity(source.len() + 16);
    let mut rest = source;
    while let Some(pos) = rest.find(NEEDLE) {
        let boundary = rest[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
        out.push_str(&rest[..pos]);
        out.push_str(if boundary { "texture2D(" } else { NEEDLE });
        rest = &rest[pos + NEEDLE.len()..];
    }
    out.push_str(rest);
    out
}

/// Which of the four `iChannelN` inputs the source mentions.
pub fn referenced_channels(source: &str) -> [bool; CHANNEL_COUNT] {
    std::array::from_fn(|i| source.contains(&format!("iChannel{i}")))
}

/// Scan the (already rewritten) source line by line.
///
/// Declaration lines become parameters and are dropped from the body; lines
/// carrying a metadata marker set title/author/delta mode and are dropped too.
/// Everything else is kept verbatim, one `\n` per line.
pub fn extract_source(
    source: &str,
    default_title: &str,
    default_author: &str,
    diagnostics: &mut Diagnostics,
) -> ConversionContext {
    let mut ctx = ConversionContext::new(default_title, default_author);
    let mut params = ParameterList::default();

    for line in source.split('\n') {
        let declared = match parse_declaration(line) {
            Some(decl) => {
                params.push(parameter_from_declaration(decl), diagnostics);
                true
            }
            None => false,
        };

        if let Some(marker) = parse_metadata_line(line) {
            match marker {
                MetadataMarker::Title(t) => ctx.title = t,
                MetadataMarker::Author(a) => ctx.author = a,
                MetadataMarker::DeltaMode => ctx.delta_mode = true,
            }
            continue;
        }

        if !declared {
            ctx.shader_body.push_str(line);
            ctx.shader_body.push('\n');
        }
    }

    ctx.parameters = params.into_vec();
    if ctx.parameters.is_empty() {
        diagnostics.info(
            "Info: No custom shader parameters (e.g., float ZGEmyVar = 1.0;) were found in your code. \
             If you expected parameters, please check the syntax.",
        );
    }
    log::debug!(
        "extracted {} parameter(s), title={:?}, author={:?}, delta={}",
        ctx.parameters.len(),
        ctx.title,
        ctx.author,
        ctx.delta_mode
    );
    ctx
}
