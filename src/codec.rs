//! Reversible compact encoding for sharing analysis state in a URL
//!
//! A payload is minified (parse then re-serialize, so pretty-printed and
//! minified inputs encode identically), DEFLATE-compressed, and base64url
//! encoded without padding, producing a token safe to carry in a URL
//! fragment: `#data=<token>`.
//!
//! Three payload shapes exist for multi-source sharing:
//! - a single unlabeled input shares its raw text unchanged (legacy
//!   single-report compatibility)
//! - any labeled input promotes the set to a `{ "sources": [...] }` wrapper
//! - two or more inputs, none labeled, share as a bare array of reports

use crate::detector::REPORT_KEYS;
use crate::error::Result;
use crate::types::SourceInput;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde_json::{Value, json};
use std::io::{Read, Write};

/// Fixed prefix of the sharable URL fragment
pub const HASH_PREFIX: &str = "#data=";

/// Compress JSON text into a URL-safe token
///
/// The text is minified first; invalid JSON is an error.
pub fn encode_payload(json_text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json_text)?;
    let minified = serde_json::to_string(&value)?;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(minified.as_bytes())?;
    let compressed = encoder.finish()?;

    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Invert [`encode_payload`]; `None` for anything that does not decode
pub fn decode_payload(token: &str) -> Option<String> {
    let compressed = URL_SAFE_NO_PAD.decode(token).ok()?;
    let mut text = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .ok()?;
    Some(text)
}

/// Build the sharable URL fragment for a JSON payload
pub fn build_hash(json_text: &str) -> Result<String> {
    Ok(format!("{HASH_PREFIX}{}", encode_payload(json_text)?))
}

/// Recover the JSON text carried in a URL fragment
///
/// `None` when the prefix is missing, the token is empty, or decompression
/// fails.
pub fn load_from_hash(hash: &str) -> Option<String> {
    let token = hash.strip_prefix(HASH_PREFIX)?;
    if token.is_empty() {
        return None;
    }
    decode_payload(token)
}

/// Combine labeled inputs into one sharable JSON payload
///
/// Exactly one unlabeled input passes through byte-for-byte. Otherwise each
/// input's text must parse; any non-empty label selects the labeled-sources
/// wrapper covering all inputs, and a fully unlabeled set becomes a bare
/// array of parsed reports in input order.
pub fn build_payload(inputs: &[SourceInput]) -> Result<String> {
    if let [only] = inputs
        && only.label.is_empty()
    {
        return Ok(only.text.clone());
    }

    if inputs.iter().any(|input| !input.label.is_empty()) {
        let sources = inputs
            .iter()
            .map(|input| {
                let data: Value = serde_json::from_str(&input.text)?;
                Ok(json!({ "label": input.label, "data": data }))
            })
            .collect::<Result<Vec<Value>>>()?;
        return Ok(serde_json::to_string(&json!({ "sources": sources }))?);
    }

    let reports = inputs
        .iter()
        .map(|input| serde_json::from_str(&input.text).map_err(Into::into))
        .collect::<Result<Vec<Value>>>()?;
    Ok(serde_json::to_string(&Value::Array(reports))?)
}

/// Invert [`build_payload`]: recover labeled inputs from shared JSON text
///
/// The presence of a `sources` key selects the wrapper branch: each array
/// entry restores with its label (missing labels become empty), and a
/// non-array `sources` restores no inputs. A bare array restores as a
/// multi-report batch only when its first element looks like a report (an
/// object carrying one of the five canonical top-level keys); any other
/// parseable shape falls through to a single legacy input carrying the text
/// itself. `None` only on JSON parse failure.
pub fn restore_from_hash(json_text: &str) -> Option<Vec<SourceInput>> {
    let value: Value = serde_json::from_str(json_text).ok()?;

    if let Some(sources) = value.get("sources") {
        let inputs = sources
            .as_array()
            .map(|sources| {
                sources
                    .iter()
                    .map(|source| SourceInput {
                        label: source
                            .get("label")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        text: source.get("data").map(pretty).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        return Some(inputs);
    }

    if let Value::Array(items) = &value
        && items
            .first()
            .and_then(Value::as_object)
            .is_some_and(|first| REPORT_KEYS.iter().any(|key| first.contains_key(*key)))
    {
        let inputs = items
            .iter()
            .map(|item| SourceInput::unlabeled(pretty(item)))
            .collect();
        return Some(inputs);
    }

    Some(vec![SourceInput::unlabeled(json_text)])
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
