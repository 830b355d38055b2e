//! Splice generated fragments into a `.zgeproj` template.
//!
//! The template is treated as text with known anchors, never parsed as XML.
//! Steps run in a fixed order so that slot indices agree across the shader
//! variables, the value blob and the name list.

pub mod patch;

use crate::{
    channels::{ChannelFragments, strip_legacy_channel_lines},
    context::ConversionContext,
    encoder::{EMPTY_BLOB, EncodedParameters},
};

use self::patch::{DocumentPatch, Edit, PatchReport};

pub const FRAGMENT_SHADER_START: &str = "<FragmentShaderSource>";
pub const FRAGMENT_SHADER_END: &str = "</FragmentShaderSource>";
pub const CANVAS_MATERIAL_START: &str = r#"<Material Name="mCanvas" Shader="MainShader">"#;
pub const MATERIAL_END: &str = "</Material>";
pub const CONTENT_END: &str = "</Content>";
pub const SHADER_CODE_START: &str = "//ShaderToy code start.";
pub const SHADER_CODE_END: &str = "//ShaderToy code end.";
pub const AUTHOR_CONSTANT: &str = r#"<Constant Name="AuthorInfo" Type="2"/>"#;
pub const PARAMETERS_SIZE_START: &str = r#"<Array Name="Parameters" SizeDim1=""#;
pub const PARAMETERS_SIZE_END: &str = r#"" Persistent="255">"#;
pub const MOUSE_VARIABLE: &str = "<ShaderVariable VariableName=\"iMouse\" VariableRef=\"uMouse\"/>\n";
pub const DEFAULT_SPEED: &str = "float Speed=1.0;";
pub const DELTA_SPEED: &str = "float Speed=(Parameters[0]-.5)*4.0;";
pub const VALUES_PLACEHOLDER: &str = "<![CDATA[789C]]>";
pub const NAMES_PLACEHOLDER: &str = "<![CDATA[Alpha\n]]>";

/// Everything the injector writes into the template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFragments {
    pub shader_code: String,
    pub material_textures: String,
    pub new_resources: String,
    pub author: String,
    pub persisted_len: usize,
    pub shader_variables: String,
    pub delta_mode: bool,
    pub value_blob: String,
    pub parameter_names: String,
}

impl ProjectFragments {
    pub fn new(ctx: &ConversionContext, channels: &ChannelFragments, encoded: &EncodedParameters) -> Self {
        let shader_variables = ctx
            .parameters
            .iter()
            .zip(&encoded.display_exprs)
            .map(|(p, expr)| {
                format!(
                    "        <ShaderVariable Name=\"{name}\" VariableName=\"{name}\" ValuePropRef=\"{expr}\"/>\n",
                    name = p.uniform_name()
                )
            })
            .collect();

        Self {
            shader_code: ctx.assembled_shader(),
            material_textures: channels.material_textures.clone(),
            new_resources: channels.new_resources.clone(),
            author: ctx.author.clone(),
            persisted_len: ctx.persisted_len(),
            shader_variables,
            delta_mode: ctx.delta_mode,
            value_blob: encoded.blob_hex.clone(),
            parameter_names: encoded.names.clone(),
        }
    }
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn rewrite_material_textures(inner: &str, textures: &str) -> String {
    let section = format!("\n      <Textures>\n{textures}      </Textures>\n    ");
    match (inner.find("<Textures>"), inner.find("</Textures>")) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{section}{}", &inner[..start], &inner[end + "</Textures>".len()..])
        }
        _ => format!("{section}{inner}"),
    }
}

pub fn build_patch(fragments: &ProjectFragments) -> DocumentPatch {
    let mut patch = DocumentPatch::new();

    patch.push(
        "strip legacy samplers",
        Edit::region(FRAGMENT_SHADER_START, FRAGMENT_SHADER_END, |inner| {
            Some(strip_legacy_channel_lines(inner))
        }),
    );

    let textures = fragments.material_textures.clone();
    patch.push(
        "material textures",
        Edit::region(CANVAS_MATERIAL_START, MATERIAL_END, move |inner| {
            Some(rewrite_material_textures(inner, &textures))
        }),
    );

    if !fragments.new_resources.is_empty() {
        patch.push(
            "new texture resources",
            Edit::insert_before_last(CONTENT_END, fragments.new_resources.clone()),
        );
    }

    let mut code = fragments.shader_code.clone();
    if !code.ends_with('\n') {
        code.push('\n');
    }
    // Markers only count inside the fragment shader source.
    let splice_code = Edit::region(SHADER_CODE_START, SHADER_CODE_END, move |_| Some(format!("\n{code}")));
    patch.push(
        "shader code",
        Edit::region(FRAGMENT_SHADER_START, FRAGMENT_SHADER_END, move |inner| {
            splice_code.apply(inner)
        }),
    );

    patch.push(
        "author",
        Edit::replace_first(
            AUTHOR_CONSTANT,
            format!(
                r#"<Constant Name="AuthorInfo" Type="2" StringValue="{}"/>"#,
                escape_attribute(&fragments.author)
            ),
        ),
    );

    let size = fragments.persisted_len.to_string();
    patch.push(
        "parameter count",
        Edit::region(PARAMETERS_SIZE_START, PARAMETERS_SIZE_END, move |inner| {
            (!inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit())).then(|| size.clone())
        }),
    );

    patch.push(
        "shader variables",
        Edit::replace_first(
            MOUSE_VARIABLE,
            format!("{MOUSE_VARIABLE}{}", fragments.shader_variables),
        ),
    );

    if fragments.delta_mode {
        patch.push("delta speed", Edit::replace_first(DEFAULT_SPEED, DELTA_SPEED));
    }

    if fragments.value_blob != EMPTY_BLOB {
        patch.push(
            "parameter values",
            Edit::replace_first(VALUES_PLACEHOLDER, format!("<![CDATA[{}]]>", fragments.value_blob)),
        );
    }

    patch.push(
        "parameter names",
        Edit::replace_first(NAMES_PLACEHOLDER, format!("<![CDATA[{}]]>", fragments.parameter_names)),
    );

    patch
}

/// Apply all substitutions; returns a fresh document and which steps applied.
pub fn inject(template: &str, fragments: &ProjectFragments) -> (String, PatchReport) {
    let template = template.replace("\r\n", "\n");
    build_patch(fragments).apply(&template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textures_section_is_replaced() {
        let inner = "\n      <Textures>\n        <MaterialTexture Texture=\"Bitmap1\"/>\n      </Textures>\n    ";
        let out = rewrite_material_textures(inner, "        <X/>\n");
        assert!(out.contains("<Textures>\n        <X/>\n      </Textures>"));
        assert!(!out.contains("Bitmap1"));
    }

    #[test]
    fn textures_section_is_inserted_when_missing() {
        let out = rewrite_material_textures("\n    ", "");
        assert!(out.starts_with("\n      <Textures>\n      </Textures>"));
    }

    #[test]
    fn author_is_escaped() {
        assert_eq!(escape_attribute(r#"A & "B" <c>"#), "A &amp; &quot;B&quot; &lt;c&gt;");
    }

    #[test]
    fn parameter_count_requires_digits() {
        let fragments = ProjectFragments {
            persisted_len: 3,
            value_blob: EMPTY_BLOB.to_string(),
            ..Default::default()
        };
        let (doc, _) = inject(r#"<Array Name="Parameters" SizeDim1="12" Persistent="255">"#, &fragments);
        assert_eq!(doc, r#"<Array Name="Parameters" SizeDim1="3" Persistent="255">"#);
        let odd = r#"<Array Name="Parameters" SizeDim1="x" Persistent="255">"#;
        let (doc, report) = inject(odd, &fragments);
        assert_eq!(doc, odd);
        assert!(report.skipped.contains(&"parameter count"));
    }

    #[test]
    fn empty_template_skips_everything() {
        let (doc, report) = inject("", &ProjectFragments::default());
        assert_eq!(doc, "");
        assert!(report.applied.is_empty());
    }

    #[test]
    fn shader_code_replaces_between_markers() {
        let fragments = ProjectFragments {
            shader_code: "void mainImage(){}".to_string(),
            value_blob: EMPTY_BLOB.to_string(),
            ..Default::default()
        };
        let doc = "<FragmentShaderSource>x\n//ShaderToy code start.\nold();\n//ShaderToy code end.\ny</FragmentShaderSource>";
        let (out, _) = inject(doc, &fragments);
        assert_eq!(
            out,
            "<FragmentShaderSource>x\n//ShaderToy code start.\nvoid mainImage(){}\n//ShaderToy code end.\ny</FragmentShaderSource>"
        );
    }

    #[test]
    fn shader_markers_outside_fragment_source_are_ignored() {
        let fragments = ProjectFragments {
            shader_code: "void mainImage(){}".to_string(),
            value_blob: EMPTY_BLOB.to_string(),
            ..Default::default()
        };
        let doc = "<Comment>//ShaderToy code start.\nnotes\n//ShaderToy code end.</Comment>\n\
                   <FragmentShaderSource>//ShaderToy code start.\nold();\n//ShaderToy code end.</FragmentShaderSource>";
        let (out, report) = inject(doc, &fragments);
        assert!(out.starts_with("<Comment>//ShaderToy code start.\nnotes\n//ShaderToy code end.</Comment>"));
        assert!(out.ends_with("//ShaderToy code start.\nvoid mainImage(){}\n//ShaderToy code end.</FragmentShaderSource>"));
        assert!(report.applied.contains(&"shader code"));

        let (untouched, report) = inject("<Comment>//ShaderToy code start.\n//ShaderToy code end.</Comment>", &fragments);
        assert_eq!(untouched, "<Comment>//ShaderToy code start.\n//ShaderToy code end.</Comment>");
        assert!(report.skipped.contains(&"shader code"));
    }
}
