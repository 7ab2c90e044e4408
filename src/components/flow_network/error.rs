//! Errors for config decoding and canvas drawing.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// A rejected card config.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The JSON did not match the config shape.
	#[error("invalid card config: {0}")]
	Json(#[from] serde_json::Error),

	/// A `grid` shorthand that is not `row:col`.
	#[error("invalid grid position `{0}`, expected `row:col`")]
	Grid(String),
}

/// A failed draw call.
#[derive(Debug, Error)]
pub enum RenderError {
	/// The canvas refused a 2d context.
	#[error("canvas has no 2d context")]
	NoContext,

	/// A canvas method threw.
	#[error("canvas call failed: {0}")]
	Canvas(String),
}

impl From<JsValue> for RenderError {
	fn from(value: JsValue) -> Self {
		RenderError::Canvas(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
