use std::io::Read;

use flate2::read::ZlibDecoder;
use proptest::prelude::*;
use zge_project_converter::{
    context::{DeclaredRange, ParamKind, ParamRange, ShaderParameter},
    diagnostics::Diagnostics,
    encoder::{decode_value_blob, encode_value_blob, normalized_value},
    pipeline::{ConversionRequest, convert_with_template},
    source::BUNDLED_TEMPLATE,
};

fn inflate_hex(hex: &str) -> Vec<f32> {
    let bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect();
    let mut raw = Vec::new();
    ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut raw).unwrap();
    raw.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn reference_inflate_round_trip() {
    let hex = encode_value_blob(&[0.0, 1.0, 0.5]).unwrap();
    assert_eq!(inflate_hex(&hex), [0.0, 1.0, 0.5]);
    assert!(decode_value_blob(&encode_value_blob(&[]).unwrap()).unwrap().is_empty());
}

fn ranged(raw: f64, min: f64, max: f64) -> ShaderParameter {
    ShaderParameter {
        id: "p".to_string(),
        kind: ParamKind::Float,
        raw_value: raw.to_string(),
        range: Some(DeclaredRange::Bounds(ParamRange { min, max })),
        tags: Vec::new(),
    }
}

proptest! {
    #[test]
    fn ranged_values_normalize_into_unit_interval(
        min in -100.0f64..100.0,
        width in 0.1f64..100.0,
        raw in -500.0f64..500.0,
    ) {
        let max = min + width;
        let mut diags = Diagnostics::new();
        let v = normalized_value(&ranged(raw, min, max), &mut diags);
        prop_assert!((0.0..=1.0).contains(&v));
        let scaled = (raw - min) / (max - min);
        let outside = !(0.0..=1.0).contains(&scaled);
        prop_assert_eq!(outside, !diags.is_empty());
        if !outside {
            prop_assert!((v - scaled).abs() < 1e-12);
        }
    }

    #[test]
    fn slots_line_up_across_artifacts(
        values in proptest::collection::vec(-2.0f64..2.0, 0..12),
        delta in any::<bool>(),
    ) {
        let mut source = String::new();
        if delta {
            source.push_str("// zgedelta\n");
        }
        for (i, v) in values.iter().enumerate() {
            source.push_str(&format!("float ZGEp{i}Val = {v};\n"));
        }
        source.push_str("void mainImage(out vec4 c, in vec2 p) {}\n");

        let conversion = convert_with_template(&ConversionRequest::new(source), BUNDLED_TEMPLATE).unwrap();
        let offset = usize::from(delta);
        let doc = &conversion.document;

        let size_anchor = format!(r#"SizeDim1="{}""#, values.len() + offset);
        prop_assert!(doc.contains(&size_anchor));
        let names: Vec<&str> = conversion.encoded.names.lines().collect();
        prop_assert_eq!(names.len(), values.len() + offset);
        prop_assert_eq!(conversion.encoded.values.len(), values.len() + offset);
        if delta {
            prop_assert_eq!(names[0], "Speed");
            prop_assert_eq!(conversion.encoded.values[0], 0.5);
        }
        if !values.is_empty() {
            prop_assert_eq!(decode_value_blob(&conversion.encoded.blob_hex).unwrap(), conversion.encoded.values.clone());
        }

        for (i, v) in values.iter().enumerate() {
            let slot = i + offset;
            let expected_name = format!("P{i} Val");
            prop_assert_eq!(names[slot], expected_name.as_str());
            prop_assert!((f64::from(conversion.encoded.values[slot]) - v.clamp(0.0, 1.0)).abs() < 1e-6);
            let binding = format!(
                r#"<ShaderVariable Name="ZGEp{i}Val" VariableName="ZGEp{i}Val" ValuePropRef="Parameters[{slot}]"/>"#
            );
            prop_assert!(doc.contains(&binding));
        }
    }
}
