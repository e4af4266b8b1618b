//! JSON Renderer
//!
//! Serialises the selection through the DTOs in [`crate::api::dto`].

use anyhow::Context;

use super::{OutputFormat, Renderer, Selection};
use crate::api::dto::SelectionDto;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn render(&self, selection: &Selection<'_>) -> anyhow::Result<String> {
        let dto = SelectionDto::from(selection);
        let mut json =
            serde_json::to_string_pretty(&dto).context("Failed to serialize call trees")?;
        json.push('\n');
        Ok(json)
    }
}
