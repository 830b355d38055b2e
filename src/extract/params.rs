//! Build the ordered parameter list from matched declarations.

use std::collections::HashSet;

use crate::{
    context::{ParamKind, ShaderParameter},
    diagnostics::Diagnostics,
    extract::declaration::Declaration,
};

/// Display hint the engine uses to draw a boolean as a checkbox.
pub const CHECKBOX_TAG: &str = "checkbox";

pub fn parameter_from_declaration(decl: Declaration) -> ShaderParameter {
    let mut tags = decl.tags;
    if decl.kind == ParamKind::Bool && !tags.iter().any(|t| t == CHECKBOX_TAG) {
        tags.push(CHECKBOX_TAG.to_string());
    }
    ShaderParameter {
        id: decl.id,
        kind: decl.kind,
        raw_value: decl.raw_value,
        range: decl.range,
        tags,
    }
}

/// Accumulates parameters in first-occurrence order.
#[derive(Debug, Default)]
pub struct ParameterList {
    params: Vec<ShaderParameter>,
    seen: HashSet<String>,
}

impl ParameterList {
    /// Duplicate ids are kept as independent entries and reported.
    pub fn push(&mut self, param: ShaderParameter, diagnostics: &mut Diagnostics) {
        if !self.seen.insert(param.id.clone()) {
            diagnostics.warning(format!(
                "Warning: Parameter {} is declared more than once; each declaration gets its own slot.",
                param.uniform_name()
            ));
        }
        self.params.push(param);
    }

    pub fn into_vec(self) -> Vec<ShaderParameter> {
        self.params
    }
}
