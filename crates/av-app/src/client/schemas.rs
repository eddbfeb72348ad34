//! Wire schema for the generation endpoint.
//!
//! The provider owns this shape and changes it at will; every assumption
//! about it stays inside this module. Requests are serialized from typed
//! structs, responses are walked as loose JSON because image payloads
//! have appeared under both snake_case and camelCase keys.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::Value;

use av_core::prompt::GenerationRequest;

use crate::error::GenerateError;

#[derive(Debug, Serialize)]
pub(super) struct GenerateContentBody {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Prompt text first, then reference blobs in their job-defined order.
pub(super) fn generate_content_body(request: &GenerationRequest) -> GenerateContentBody {
    let mut parts = Vec::with_capacity(1 + request.references.len());
    parts.push(Part::Text { text: request.prompt.clone() });
    for blob in &request.references {
        parts.push(Part::Inline {
            inline_data: InlineData {
                mime_type: blob.mime.clone(),
                data: BASE64.encode(&blob.bytes),
            },
        });
    }
    GenerateContentBody { contents: vec![Content { parts }] }
}

/// Map a non-success HTTP status to its failure kind.
pub(super) fn classify_http_failure(status: u16, body: &str) -> GenerateError {
    let detail = format!("HTTP {status}: {}", snippet(body));
    match status {
        401 | 403 => GenerateError::Auth(detail),
        // The endpoint reports a bad key as a 400 with an explanatory body.
        400 if body.contains("API key") || body.contains("API_KEY") => GenerateError::Auth(detail),
        429 => GenerateError::Quota(detail),
        _ => GenerateError::Network(detail),
    }
}

/// Find and decode the first inline image anywhere in the response.
pub(super) fn extract_image_bytes(value: &Value) -> Result<Vec<u8>, GenerateError> {
    let data = find_inline_image(value)
        .ok_or_else(|| GenerateError::ResponseFormat("response contains no image data".into()))?;
    BASE64
        .decode(data)
        .map_err(|e| GenerateError::ResponseFormat(format!("invalid base64 image payload: {e}")))
}

fn find_inline_image(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            for key in ["inline_data", "inlineData"] {
                if let Some(Value::Object(inline)) = map.get(key) {
                    let mime = inline
                        .get("mime_type")
                        .or_else(|| inline.get("mimeType"))
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    if mime.starts_with("image/") {
                        if let Some(data) = inline.get("data").and_then(Value::as_str) {
                            if !data.is_empty() {
                                return Some(data);
                            }
                        }
                    }
                }
            }
            map.values().find_map(find_inline_image)
        }
        Value::Array(items) => items.iter().find_map(find_inline_image),
        _ => None,
    }
}

fn snippet(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        let cut: String = body.chars().take(LIMIT).collect();
        format!("{cut}…")
    }
}
