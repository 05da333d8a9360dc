use std::sync::Arc;

use badge_renderer::compose::{BadgeTemplate, DEFAULT_COMPANY_WRAP_WIDTH, DEFAULT_SCALE_FACTOR};
use badge_renderer::model::{BadgeFields, PlaceholderMap};
use badge_renderer::placeholder::detect;
use badge_renderer::registry::{TemplateId, TemplateRecord};
use badge_renderer::render::raster_request;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadgeRenderOptions {
    /// Treat the body as built-in template 1-4 instead of a custom upload.
    template_id: Option<u8>,
    scale: Option<f64>,
    company_wrap_width: Option<usize>,
    placeholders: Option<PlaceholderMap>,
}

fn build_template(body: &str, options: &BadgeRenderOptions) -> Result<BadgeTemplate, String> {
    if let Some(number) = options.template_id {
        let id = TemplateId::from_number(number)
            .ok_or_else(|| format!("unknown template id {number}"))?;
        let record = Arc::new(TemplateRecord::from_body(id.to_string(), body));
        return Ok(BadgeTemplate::BuiltIn { id, record });
    }

    let record = TemplateRecord::from_body("custom", body);
    Ok(match &options.placeholders {
        Some(placeholders) => BadgeTemplate::Custom {
            record,
            placeholders: placeholders.clone(),
        },
        None => BadgeTemplate::custom(record),
    })
}

fn render(template: &str, fields_json: &str, options: BadgeRenderOptions) -> Result<String, String> {
    let fields: BadgeFields = serde_json::from_str(fields_json).map_err(|error| error.to_string())?;
    let template = build_template(template, &options)?;
    let (_, request) = raster_request(
        &template,
        &fields,
        options.company_wrap_width.unwrap_or(DEFAULT_COMPANY_WRAP_WIDTH),
        options.scale.unwrap_or(DEFAULT_SCALE_FACTOR),
    );
    Ok(request.svg)
}

/// Composes a badge and returns the export-sized SVG.
#[wasm_bindgen]
pub fn render_badge_svg(
    template: &str,
    fields_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<BadgeRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        BadgeRenderOptions::default()
    };

    render(template, fields_json, options).map_err(|error| JsValue::from_str(&error))
}

/// Detected placeholder map as JSON, keyed by field.
#[wasm_bindgen]
pub fn detect_placeholders(template: &str) -> Result<String, JsValue> {
    serde_json::to_string(&detect(template)).map_err(|error| JsValue::from_str(&error.to_string()))
}
