//! Parameter value normalization and the persisted `Parameters` blob.
//!
//! The engine stores every parameter as a float in `[0, 1]`. Authored values
//! are rescaled into that domain here, and a display expression maps the
//! persisted value back into the declared range when the shader reads it.

use std::io::{Read, Write};

use anyhow::{Context, Result, anyhow, bail};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};

use crate::{
    context::{ConversionContext, DeclaredRange, PARAM_PREFIX, ParamKind, ShaderParameter},
    diagnostics::Diagnostics,
    extract::declaration::leading_number,
};

/// Blob stored for an empty `Parameters` array.
pub const EMPTY_BLOB: &str = "789c";

/// Initial value of the Speed slot in delta mode.
pub const DELTA_SPEED_DEFAULT: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedParameters {
    /// Persisted values, Speed slot first in delta mode.
    pub values: Vec<f32>,
    /// Hex of the zlib-compressed little-endian f32 array.
    pub blob_hex: String,
    /// One `ValuePropRef` expression per parameter, in declaration order.
    pub display_exprs: Vec<String>,
    /// Content of the parameter-name CDATA block, one line per slot.
    pub names: String,
}

pub fn encode_parameters(ctx: &ConversionContext, diagnostics: &mut Diagnostics) -> Result<EncodedParameters> {
    let offset = ctx.slot_offset();
    let mut values = Vec::with_capacity(ctx.persisted_len());
    let mut names = String::new();
    if ctx.delta_mode {
        values.push(DELTA_SPEED_DEFAULT);
        names.push_str("Speed\n");
    }

    let mut display_exprs = Vec::with_capacity(ctx.parameters.len());
    for (i, param) in ctx.parameters.iter().enumerate() {
        values.push(normalized_value(param, diagnostics) as f32);
        display_exprs.push(display_expression(param, offset + i));
        names.push_str(&name_line(param));
        names.push('\n');
    }

    let blob_hex = encode_value_blob(&values)?;
    Ok(EncodedParameters {
        values,
        blob_hex,
        display_exprs,
        names,
    })
}

/// Authored value of a boolean: `true`/`1`/`1.0` or `false`/`0`/`0.0`.
pub fn bool_value(param: &ShaderParameter, diagnostics: &mut Diagnostics) -> f64 {
    match param.raw_value.to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => 1.0,
        "false" | "0" | "0.0" => 0.0,
        _ => {
            diagnostics.warning(format!(
                "Warning: Boolean parameter {} has invalid value \"{}\". Defaulting to false (0.0).",
                param.uniform_name(),
                param.raw_value
            ));
            0.0
        }
    }
}

/// Numeric prefix of the initializer, so `0.5f` reads as `0.5`.
fn parse_float_value(param: &ShaderParameter, diagnostics: &mut Diagnostics) -> Option<f64> {
    match leading_number(&param.raw_value) {
        Some(v) if v.is_finite() => Some(v),
        _ => {
            diagnostics.warning(format!(
                "Warning: Parameter {} has non-numeric value \"{}\". Defaulting to 0.0.",
                param.uniform_name(),
                param.raw_value
            ));
            None
        }
    }
}

/// Persisted value of one parameter; always finite and within `[0, 1]`.
pub fn normalized_value(param: &ShaderParameter, diagnostics: &mut Diagnostics) -> f64 {
    if param.kind == ParamKind::Bool {
        return bool_value(param, diagnostics);
    }
    let Some(value) = parse_float_value(param, diagnostics) else {
        return 0.0;
    };
    let name = param.uniform_name();

    match &param.range {
        Some(DeclaredRange::Bounds(r)) if r.is_unit() => {
            let clamped = value.clamp(0.0, 1.0);
            if clamped != value {
                diagnostics.info(format!(
                    "Info: Parameter {name} (value: {value:.3}) was clamped to {clamped:.1} as its range is 0.0-1.0."
                ));
            }
            clamped
        }
        Some(DeclaredRange::Bounds(r)) => {
            if r.max == r.min {
                return if value >= r.min { 1.0 } else { 0.0 };
            }
            let scaled = (value - r.min) / (r.max - r.min);
            if !(0.0..=1.0).contains(&scaled) {
                diagnostics.info(format!(
                    "Info: Parameter {name} (value: {value:.3}) was outside its defined range [{}, {}]. \
                     Scaled value {scaled:.3} clamped to 0-1.",
                    r.min, r.max
                ));
            }
            scaled.clamp(0.0, 1.0)
        }
        Some(DeclaredRange::Malformed(text)) => {
            let clamped = value.clamp(0.0, 1.0);
            diagnostics.warning(format!(
                "Warning: Parameter {name} has invalid range values (Range: {text}). \
                 Using value {value} clamped to 0-1."
            ));
            clamped
        }
        None => {
            let clamped = value.clamp(0.0, 1.0);
            if clamped != value {
                diagnostics.warning(format!(
                    "Warning: Parameter {name} (value: {value:.3}) was clamped to {clamped:.1} as no custom range \
                     was set (defaulting to 0-1)."
                ));
            }
            clamped
        }
    }
}

/// Expression reading the parameter back from persisted slot `slot`.
pub fn display_expression(param: &ShaderParameter, slot: usize) -> String {
    let slot_ref = format!("Parameters[{slot}]");
    match param.bounds() {
        Some(r) if param.kind == ParamKind::Float && !r.is_unit() => format!(
            "((({slot_ref} - 0.0) * ({} - {})) / (1.0 - 0.0)) + {}",
            r.max, r.min, r.min
        ),
        _ => slot_ref,
    }
}

/// `fooBarBaz` -> `Foo Bar Baz`; a leading `ZGE` is dropped.
pub fn display_name(id: &str) -> String {
    let id = id.strip_prefix(PARAM_PREFIX).unwrap_or(id);
    let mut words: Vec<String> = Vec::new();
    for c in id.chars() {
        if c.is_ascii_uppercase() || words.is_empty() {
            words.push(String::new());
        }
        if let Some(w) = words.last_mut() {
            w.push(c);
        }
    }
    if let Some(first) = words.first_mut() {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            let capitalized: String = c.to_uppercase().chain(chars).collect();
            *first = capitalized;
        }
    }
    words.join(" ")
}

/// Display name followed by ` @tag` for each tag.
pub fn name_line(param: &ShaderParameter) -> String {
    let mut line = display_name(&param.id);
    for tag in &param.tags {
        line.push_str(" @");
        line.push_str(tag);
    }
    line
}

/// Little-endian f32s, zlib-compressed, as lowercase hex.
pub fn encode_value_blob(values: &[f32]) -> Result<String> {
    if values.is_empty() {
        return Ok(EMPTY_BLOB.to_string());
    }
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes).context("failed to compress parameter values")?;
    let compressed = encoder.finish().context("failed to finish parameter value stream")?;
    Ok(to_hex(&compressed))
}

/// Inverse of [`encode_value_blob`]; the empty sentinel decodes to no values.
pub fn decode_value_blob(hex: &str) -> Result<Vec<f32>> {
    let hex = hex.trim();
    if hex.eq_ignore_ascii_case(EMPTY_BLOB) {
        return Ok(Vec::new());
    }
    let compressed = from_hex(hex)?;
    let mut bytes = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut bytes)
        .context("failed to inflate parameter blob")?;
    if bytes.len() % 4 != 0 {
        bail!("parameter blob has {} bytes, expected a multiple of 4", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        bail!("hex blob has odd length {}", hex.len());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            let pair = hex.get(i..i + 2).ok_or_else(|| anyhow!("invalid hex at offset {i}"))?;
            u8::from_str_radix(pair, 16).map_err(|e| anyhow!("invalid hex {pair:?} at offset {i}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParamRange;

    fn param(kind: ParamKind, raw: &str, range: Option<DeclaredRange>) -> ShaderParameter {
        ShaderParameter {
            id: "value".to_string(),
            kind,
            raw_value: raw.to_string(),
            range,
            tags: Vec::new(),
        }
    }

    fn bounds(min: f64, max: f64) -> Option<DeclaredRange> {
        Some(DeclaredRange::Bounds(ParamRange { min, max }))
    }

    #[test]
    fn scales_into_declared_range() {
        let mut d = Diagnostics::new();
        let v = normalized_value(&param(ParamKind::Float, "2.5", bounds(0.0, 5.0)), &mut d);
        assert!((v - 0.5).abs() < 1e-9);
        assert!(d.is_empty());
    }

    #[test]
    fn clamps_out_of_range_with_diagnostic() {
        let mut d = Diagnostics::new();
        let v = normalized_value(&param(ParamKind::Float, "12", bounds(2.0, 10.0)), &mut d);
        assert_eq!(v, 1.0);
        assert_eq!(d.len(), 1);

        let mut d = Diagnostics::new();
        let v = normalized_value(&param(ParamKind::Float, "-3", None), &mut d);
        assert_eq!(v, 0.0);
        assert!(d.has_warnings());
    }

    #[test]
    fn unit_range_is_identity() {
        let mut d = Diagnostics::new();
        let p = param(ParamKind::Float, "0.3", bounds(0.0, 1.0));
        assert!((normalized_value(&p, &mut d) - 0.3).abs() < 1e-9);
        assert_eq!(display_expression(&p, 4), "Parameters[4]");
    }

    #[test]
    fn degenerate_range_guard() {
        let mut d = Diagnostics::new();
        assert_eq!(normalized_value(&param(ParamKind::Float, "3", bounds(3.0, 3.0)), &mut d), 1.0);
        assert_eq!(normalized_value(&param(ParamKind::Float, "2", bounds(3.0, 3.0)), &mut d), 0.0);
    }

    #[test]
    fn invalid_values_default_to_zero() {
        let mut d = Diagnostics::new();
        assert_eq!(normalized_value(&param(ParamKind::Bool, "maybe", None), &mut d), 0.0);
        assert_eq!(normalized_value(&param(ParamKind::Float, "sin(1.0)", None), &mut d), 0.0);
        assert_eq!(normalized_value(&param(ParamKind::Float, "inf", None), &mut d), 0.0);
        assert_eq!(d.count(crate::diagnostics::Level::Warning), 3);
    }

    #[test]
    fn float_values_use_numeric_prefix() {
        let mut d = Diagnostics::new();
        assert!((normalized_value(&param(ParamKind::Float, "0.5f", None), &mut d) - 0.5).abs() < 1e-9);
        assert_eq!(normalized_value(&param(ParamKind::Float, "1.0/3.0", None), &mut d), 1.0);
        let v = normalized_value(&param(ParamKind::Float, "7.5f", bounds(5.0, 10.0)), &mut d);
        assert!((v - 0.5).abs() < 1e-9);
        assert!(d.is_empty());

        assert_eq!(normalized_value(&param(ParamKind::Float, "1e999", None), &mut d), 0.0);
        assert!(d.has_warnings());
    }

    #[test]
    fn bool_literals() {
        let mut d = Diagnostics::new();
        for raw in ["true", "TRUE", "1", "1.0"] {
            assert_eq!(bool_value(&param(ParamKind::Bool, raw, None), &mut d), 1.0);
        }
        for raw in ["false", "0", "0.0"] {
            assert_eq!(bool_value(&param(ParamKind::Bool, raw, None), &mut d), 0.0);
        }
        assert!(d.is_empty());
    }

    #[test]
    fn malformed_range_clamps_raw_value() {
        let mut d = Diagnostics::new();
        let p = param(ParamKind::Float, "0.7", Some(DeclaredRange::Malformed("a,b".into())));
        assert!((normalized_value(&p, &mut d) - 0.7).abs() < 1e-9);
        assert!(d.has_warnings());
        assert_eq!(display_expression(&p, 0), "Parameters[0]");
    }

    #[test]
    fn display_expression_reconstructs_range() {
        let p = param(ParamKind::Float, "1", bounds(-2.0, 5.5));
        assert_eq!(
            display_expression(&p, 3),
            "(((Parameters[3] - 0.0) * (5.5 - -2)) / (1.0 - 0.0)) + -2"
        );
        let b = param(ParamKind::Bool, "1", bounds(0.0, 5.0));
        assert_eq!(display_expression(&b, 1), "Parameters[1]");
    }

    #[test]
    fn display_names_split_on_capitals() {
        assert_eq!(display_name("myVarName"), "My Var Name");
        assert_eq!(display_name("foo"), "Foo");
        assert_eq!(display_name("ZGEColorShift"), "Color Shift");
        assert_eq!(display_name("HDR"), "H D R");
        assert_eq!(display_name("_x"), "_x");
    }

    #[test]
    fn blob_header_is_zlib_default() {
        let hex = encode_value_blob(&[0.0, 1.0, 0.5]).unwrap();
        assert!(hex.starts_with("789c"));
        assert_eq!(hex, hex.to_ascii_lowercase());
        assert_eq!(decode_value_blob(&hex).unwrap(), [0.0, 1.0, 0.5]);
    }

    #[test]
    fn empty_blob_is_sentinel() {
        assert_eq!(encode_value_blob(&[]).unwrap(), EMPTY_BLOB);
        assert!(decode_value_blob("789C").unwrap().is_empty());
        assert!(decode_value_blob("zz").is_err());
    }
}
