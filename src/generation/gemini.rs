use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::GenerationError;
use crate::generation::backend::ImageGenerator;
use crate::generation::presets::Resolution;
use crate::raster::RasterSnapshot;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Optional override of the API root, e.g. for a proxy
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const EDIT_MODEL: &str = "gemini-2.5-flash-image";
const GENERATE_MODEL: &str = "imagen-4.0-generate-001";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Google's Gemini image models over the public REST API.
///
/// Edits go through `generateContent` on the multimodal model; text-only
/// requests go through `predict` on the Imagen model.
pub struct GeminiGenerator {
    api_base: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: String, api_base: Option<String>) -> Result<Self, GenerationError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Failed(format!("Failed to build HTTP client: {e}")))?;
        let api_base = api_base
            .map(|base| base.trim().trim_end_matches('/').to_owned())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());

        Ok(Self {
            api_base,
            api_key,
            http,
        })
    }

    /// Builds a generator from `GEMINI_API_KEY`, or `None` when the key is unset
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_env(API_KEY_ENV)?;
        match Self::new(api_key, non_empty_env(API_BASE_ENV)) {
            Ok(generator) => Some(generator),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    fn post(&self, url: &str, payload: &Value) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .map_err(|e| GenerationError::Failed(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GenerationError::Failed(format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(GenerationError::Failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                api_error_message(&body)
            )));
        }
        Ok(body)
    }
}

impl ImageGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn edit_image(
        &self,
        source: &RasterSnapshot,
        instruction: &str,
        style: Option<&RasterSnapshot>,
    ) -> Result<RasterSnapshot, GenerationError> {
        let payload = edit_payload(source, instruction, style)?;
        log::debug!("Sending edit request to {}", EDIT_MODEL);
        let body = self.post(&self.endpoint(EDIT_MODEL, "generateContent"), &payload)?;
        image_from_content_response(&body)
    }

    fn generate_image(
        &self,
        prompt: &str,
        resolution: Resolution,
    ) -> Result<RasterSnapshot, GenerationError> {
        let payload = generate_payload(prompt, resolution);
        log::debug!("Sending generate request to {}", GENERATE_MODEL);
        let body = self.post(&self.endpoint(GENERATE_MODEL, "predict"), &payload)?;
        image_from_predict_response(&body)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn inline_png(image: &RasterSnapshot) -> Result<Value, GenerationError> {
    let png = image.encode_png()?;
    Ok(json!({
        "inlineData": {
            "mimeType": "image/png",
            "data": BASE64.encode(png),
        }
    }))
}

/// Content image first, then the style reference, then the instruction
fn edit_payload(
    source: &RasterSnapshot,
    instruction: &str,
    style: Option<&RasterSnapshot>,
) -> Result<Value, GenerationError> {
    let mut parts = vec![inline_png(source)?];
    if let Some(style) = style {
        parts.push(inline_png(style)?);
    }
    parts.push(json!({ "text": instruction }));

    Ok(json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "responseModalities": ["IMAGE"] },
    }))
}

fn generate_payload(prompt: &str, resolution: Resolution) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": resolution.value(),
            "outputOptions": { "mimeType": "image/png" },
        },
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InlineData {
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    rai_filtered_reason: Option<String>,
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, GenerationError> {
    serde_json::from_str(body)
        .map_err(|e| GenerationError::Failed(format!("Malformed response: {e}")))
}

fn decode_image(data: &str) -> Result<RasterSnapshot, GenerationError> {
    let bytes = BASE64
        .decode(data.trim())
        .map_err(|e| GenerationError::Failed(format!("Image data is not valid base64: {e}")))?;
    Ok(RasterSnapshot::decode(&bytes)?)
}

/// Pulls the first inline image out of a `generateContent` reply.
///
/// No candidates means the prompt was blocked. A reply with only text
/// carries the model's refusal, which becomes the error message.
fn image_from_content_response(body: &str) -> Result<RasterSnapshot, GenerationError> {
    let response: ContentResponse = parse(body)?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "safety policies".to_owned());
        return Err(GenerationError::Blocked(reason));
    };

    let parts = candidate.content.map(|content| content.parts).unwrap_or_default();
    if let Some(inline) = parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
    {
        return decode_image(&inline.data);
    }

    let text = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim();
    if text.is_empty() {
        Err(GenerationError::NoImage(
            "the model may have refused to generate the content".to_owned(),
        ))
    } else {
        Err(GenerationError::NoImage(text.to_owned()))
    }
}

/// Pulls the first image out of an Imagen `predict` reply
fn image_from_predict_response(body: &str) -> Result<RasterSnapshot, GenerationError> {
    let response: PredictResponse = parse(body)?;

    for prediction in &response.predictions {
        if let Some(data) = prediction.bytes_base64_encoded.as_deref().filter(|d| !d.is_empty()) {
            return decode_image(data);
        }
    }
    if let Some(reason) = response
        .predictions
        .into_iter()
        .find_map(|prediction| prediction.rai_filtered_reason)
    {
        return Err(GenerationError::Blocked(reason));
    }
    Err(GenerationError::NoImage(
        "no images were returned, possibly due to safety filters".to_owned(),
    ))
}

/// The `error.message` of a failed call, or the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_base64(width: u32, height: u32) -> String {
        let pixels = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let snapshot = RasterSnapshot::from_image(pixels);
        BASE64.encode(snapshot.encode_png().unwrap())
    }

    #[test]
    fn test_content_response_with_image_part() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": png_base64(3, 2) } }
                ]}
            }]
        })
        .to_string();

        let image = image_from_content_response(&body).unwrap();
        assert_eq!(image.size(), [3, 2]);
        assert_eq!(image.pixel(0, 0), Some(egui::Color32::from_rgb(10, 20, 30)));
    }

    #[test]
    fn test_blocked_prompt_reports_reason() {
        let body = r#"{"promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}}"#;
        match image_from_content_response(body) {
            Err(GenerationError::Blocked(reason)) => assert_eq!(reason, "PROHIBITED_CONTENT"),
            other => panic!("expected a blocked error, got {other:?}"),
        }

        assert!(matches!(
            image_from_content_response(r#"{"candidates": []}"#),
            Err(GenerationError::Blocked(_))
        ));
    }

    #[test]
    fn test_text_only_reply_becomes_the_error() {
        let body =
            r#"{"candidates": [{"content": {"parts": [{"text": "  I can't draw that.  "}]}}]}"#;
        match image_from_content_response(body) {
            Err(GenerationError::NoImage(message)) => assert_eq!(message, "I can't draw that."),
            other => panic!("expected a no-image error, got {other:?}"),
        }

        let empty = r#"{"candidates": [{"finishReason": "STOP"}]}"#;
        assert!(matches!(image_from_content_response(empty), Err(GenerationError::NoImage(_))));
    }

    #[test]
    fn test_bad_payloads_fail() {
        assert!(matches!(image_from_content_response("not json"), Err(GenerationError::Failed(_))));

        let body = r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": "@@@"}}]}}]}"#;
        assert!(matches!(image_from_content_response(body), Err(GenerationError::Failed(_))));
    }

    #[test]
    fn test_predict_response() {
        let body = json!({
            "predictions": [{ "bytesBase64Encoded": png_base64(4, 4), "mimeType": "image/png" }]
        })
        .to_string();
        assert_eq!(image_from_predict_response(&body).unwrap().size(), [4, 4]);

        let filtered = r#"{"predictions": [{"raiFilteredReason": "Unsafe prompt"}]}"#;
        assert!(matches!(image_from_predict_response(filtered), Err(GenerationError::Blocked(_))));
        assert!(matches!(image_from_predict_response("{}"), Err(GenerationError::NoImage(_))));
    }

    #[test]
    fn test_edit_payload_orders_parts() {
        let source = RasterSnapshot::from_image(RgbaImage::new(2, 2));
        let style = RasterSnapshot::from_image(RgbaImage::new(1, 1));
        let payload = edit_payload(&source, "redraw", Some(&style)).unwrap();

        let parts = payload.pointer("/contents/0/parts").and_then(Value::as_array).unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].get("inlineData").is_some());
        assert!(parts[1].get("inlineData").is_some());
        assert_eq!(parts[2]["text"], "redraw");
        assert_eq!(payload["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[test]
    fn test_generate_payload_carries_aspect_ratio() {
        let payload = generate_payload("a lighthouse", Resolution::WideLandscape);
        assert_eq!(payload["instances"][0]["prompt"], "a lighthouse");
        assert_eq!(payload["parameters"]["aspectRatio"], "16:9");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message("gateway timeout\n"), "gateway timeout");
    }

    #[test]
    fn test_api_base_is_normalised() {
        let base = Some("https://proxy.example/v1/ ".to_owned());
        let generator = GeminiGenerator::new("key".to_owned(), base).unwrap();
        assert_eq!(
            generator.endpoint(EDIT_MODEL, "generateContent"),
            "https://proxy.example/v1/models/gemini-2.5-flash-image:generateContent"
        );

        let generator = GeminiGenerator::new("key".to_owned(), None).unwrap();
        assert!(generator.endpoint(GENERATE_MODEL, "predict").starts_with(DEFAULT_API_BASE));
    }
}
