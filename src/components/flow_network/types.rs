//! Card configuration as supplied by the host dashboard.
//!
//! Every field is optional in the host's JSON; defaults mirror the stock card.

use serde::Deserialize;

use super::error::ConfigError;

/// Top-level card configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FlowConfig {
	/// Static layer fill; `"transparent"` or empty leaves it clear.
	#[serde(default = "default_background")]
	pub background: String,
	/// CSS font family for labels and values.
	#[serde(default = "default_font_family")]
	pub font_family: String,
	/// Decimal places for node values.
	#[serde(default = "default_value_precision")]
	pub value_precision: u32,
	/// Value text colour for nodes without their own.
	#[serde(default = "default_node_text_color")]
	pub node_text_color: String,
	/// Minimum gap between the icon and the value text.
	#[serde(default = "default_value_offset_px")]
	pub value_offset_px: f64,
	/// Unit conversion for every value.
	#[serde(default)]
	pub compute: ComputeConfig,
	/// Grid layout.
	#[serde(default)]
	pub layout: LayoutConfig,
	/// Moving indicator style.
	#[serde(default)]
	pub dot: DotConfig,
	/// Links without a flow entity.
	#[serde(default)]
	pub missing_behavior: MissingBehavior,
	/// Automatic curvature for sibling links.
	#[serde(default)]
	pub link_fan_out: FanOutConfig,
	/// Value driven speed.
	#[serde(default)]
	pub speed_mapping: SpeedMapping,
	/// Nodes in declaration order.
	#[serde(default)]
	pub nodes: Vec<NodeConfig>,
	/// Links; ones naming an unknown node are dropped.
	#[serde(default)]
	pub links: Vec<LinkConfig>,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			background: default_background(),
			font_family: default_font_family(),
			value_precision: default_value_precision(),
			node_text_color: default_node_text_color(),
			value_offset_px: default_value_offset_px(),
			compute: ComputeConfig::default(),
			layout: LayoutConfig::default(),
			dot: DotConfig::default(),
			missing_behavior: MissingBehavior::default(),
			link_fan_out: FanOutConfig::default(),
			speed_mapping: SpeedMapping::default(),
			nodes: Vec::new(),
			links: Vec::new(),
		}
	}
}

impl FlowConfig {
	/// Decode the host's JSON config object.
	pub fn from_json(source: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(source)?)
	}

	/// Decode an already-parsed JSON value.
	pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
		Ok(serde_json::from_value(value)?)
	}
}

fn default_background() -> String {
	"transparent".into()
}

fn default_font_family() -> String {
	"Inter, Roboto, system-ui, sans-serif".into()
}

fn default_value_precision() -> u32 {
	2
}

fn default_node_text_color() -> String {
	"rgba(255,255,255,0.92)".into()
}

fn default_value_offset_px() -> f64 {
	8.0
}

/// Global unit conversion applied to every displayed node value.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ComputeConfig {
	/// Conversion applied before formatting.
	#[serde(default)]
	pub unit_mode: UnitMode,
	/// Replaces the unit text when set.
	#[serde(default)]
	pub suffix: Option<String>,
	/// Overrides [`FlowConfig::value_precision`].
	#[serde(default)]
	pub precision: Option<u32>,
}

/// How displayed values are scaled.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitMode {
	/// Show the entity's own unit.
	#[default]
	Keep,
	/// Divide by 1000 and show `kW`.
	WToKw,
}

/// Grid layout parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LayoutConfig {
	/// Column count before responsive collapse.
	#[serde(default = "default_columns")]
	pub columns: u32,
	/// Drop columns until the preferred width fits.
	#[serde(default = "default_true")]
	pub responsive: bool,
	/// Horizontal gap between cells.
	#[serde(default = "default_gap_x")]
	pub gap_x: f64,
	/// Vertical gap between rows.
	#[serde(default = "default_gap_y")]
	pub gap_y: f64,
	/// Left and right padding.
	#[serde(default = "default_padding_x")]
	pub padding_x: f64,
	/// Top and bottom padding.
	#[serde(default = "default_padding_y")]
	pub padding_y: f64,
	/// Upper bound on cell width.
	#[serde(default = "default_preferred_col_width")]
	pub preferred_col_width: f64,
	/// Decouples cell height from cell width when set.
	#[serde(default)]
	pub cell_height: Option<f64>,
	/// Size the host surface to the content height.
	#[serde(default = "default_true")]
	pub auto_height: bool,
	/// Smallest auto node size.
	#[serde(default = "default_node_min_size")]
	pub node_min_size: f64,
	/// Largest auto node size.
	#[serde(default = "default_node_max_size")]
	pub node_max_size: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			columns: default_columns(),
			responsive: true,
			gap_x: default_gap_x(),
			gap_y: default_gap_y(),
			padding_x: default_padding_x(),
			padding_y: default_padding_y(),
			preferred_col_width: default_preferred_col_width(),
			cell_height: None,
			auto_height: true,
			node_min_size: default_node_min_size(),
			node_max_size: default_node_max_size(),
		}
	}
}

fn default_columns() -> u32 {
	4
}

fn default_true() -> bool {
	true
}

fn default_gap_x() -> f64 {
	28.0
}

fn default_gap_y() -> f64 {
	22.0
}

fn default_padding_x() -> f64 {
	22.0
}

fn default_padding_y() -> f64 {
	18.0
}

fn default_preferred_col_width() -> f64 {
	160.0
}

fn default_node_min_size() -> f64 {
	56.0
}

fn default_node_max_size() -> f64 {
	120.0
}

/// Moving indicator style.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DotConfig {
	/// Radius in CSS pixels.
	#[serde(default = "default_dot_size")]
	pub size: f64,
	/// Draw a shadow glow around each dot.
	#[serde(default = "default_true")]
	pub glow: bool,
	/// Fraction of the path spent fading in and out.
	#[serde(default = "default_fade_zone")]
	pub fade_zone: f64,
}

impl Default for DotConfig {
	fn default() -> Self {
		Self {
			size: default_dot_size(),
			glow: true,
			fade_zone: default_fade_zone(),
		}
	}
}

impl DotConfig {
	/// Dot radius with the 3px floor applied.
	pub fn radius(&self) -> f64 {
		self.size.max(3.0)
	}

	/// Fade zone with the 0.02 floor applied.
	pub fn effective_fade_zone(&self) -> f64 {
		if self.fade_zone.is_finite() {
			self.fade_zone.max(0.02)
		} else {
			default_fade_zone()
		}
	}
}

fn default_dot_size() -> f64 {
	5.0
}

fn default_fade_zone() -> f64 {
	0.10
}

/// What a link without any flow entity does.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingBehavior {
	/// Never animate.
	#[default]
	Stop,
	/// Animate forward from the source node's value.
	Infer,
}

/// Automatic curvature for links sharing an endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FanOutConfig {
	/// Curve siblings apart.
	#[serde(default = "default_true")]
	pub enabled: bool,
	/// Chord fraction per sibling step.
	#[serde(default = "default_fan_strength")]
	pub strength: f64,
}

impl Default for FanOutConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			strength: default_fan_strength(),
		}
	}
}

fn default_fan_strength() -> f64 {
	0.12
}

/// Optional linear mapping from |flow value| to animation speed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SpeedMapping {
	/// Use the mapping instead of each link's fixed speed.
	#[serde(default)]
	pub enabled: bool,
	/// Value mapped to `speed_min`.
	#[serde(default)]
	pub value_min: f64,
	/// Value mapped to `speed_max`.
	#[serde(default = "default_value_max")]
	pub value_max: f64,
	/// Slowest speed, in path lengths per second.
	#[serde(default = "default_speed_min")]
	pub speed_min: f64,
	/// Fastest speed, in path lengths per second.
	#[serde(default = "default_speed_max")]
	pub speed_max: f64,
}

impl Default for SpeedMapping {
	fn default() -> Self {
		Self {
			enabled: false,
			value_min: 0.0,
			value_max: default_value_max(),
			speed_min: default_speed_min(),
			speed_max: default_speed_max(),
		}
	}
}

fn default_value_max() -> f64 {
	5000.0
}

fn default_speed_min() -> f64 {
	0.2
}

fn default_speed_max() -> f64 {
	2.0
}

/// Node outline.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
	/// Circle of diameter `size`.
	Circle,
	/// Axis-aligned square.
	Square,
	/// Square with rounded corners.
	#[default]
	Rounded,
}

/// One arithmetic operand: a constant, a numeric string, an entity id or a list of those.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Term {
	/// A constant.
	Number(f64),
	/// A numeric string or an entity id.
	Text(String),
	/// Sum of the members.
	List(Vec<Term>),
}

/// One node as configured.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NodeConfig {
	/// Link target name; defaults to `n<index>`.
	#[serde(default)]
	pub id: Option<String>,
	/// Caption; defaults to the id.
	#[serde(default)]
	pub label: Option<String>,
	/// Entity whose value is shown.
	#[serde(default)]
	pub entity: Option<String>,
	/// Added to the entity value.
	#[serde(default)]
	pub add: Option<Term>,
	/// Subtracted from the entity value.
	#[serde(default)]
	pub subtract: Option<Term>,
	/// Outline shape.
	#[serde(default)]
	pub shape: Shape,
	/// Fixed size, overriding the cell-derived one.
	#[serde(default)]
	pub size: Option<f64>,
	/// Ring colour.
	#[serde(default)]
	pub ring: Option<String>,
	/// Fill colour.
	#[serde(default)]
	pub fill: Option<String>,
	/// Ring stroke width.
	#[serde(default, alias = "ringWidth")]
	pub ring_width: Option<f64>,
	/// Value text colour.
	#[serde(default)]
	pub color: Option<String>,
	/// Fixed label font size.
	#[serde(default, alias = "fontSize")]
	pub font_size: Option<f64>,
	/// Placement order; defaults to the declaration index.
	#[serde(default)]
	pub order: Option<i64>,
	/// Icon name.
	#[serde(default)]
	pub icon: Option<String>,
	/// Fixed icon size.
	#[serde(default)]
	pub icon_size: Option<f64>,
	/// Icon colour.
	#[serde(default)]
	pub icon_color: Option<String>,
	/// 1-based row, may be fractional.
	#[serde(default)]
	pub row: Option<f64>,
	/// 1-based column.
	#[serde(default)]
	pub col: Option<f64>,
	/// `"row:col"` shorthand, used when `row`/`col` are absent.
	#[serde(default)]
	pub grid: Option<String>,
}

/// One link as configured.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LinkConfig {
	/// Source node id.
	#[serde(default)]
	pub from: String,
	/// Target node id.
	#[serde(default)]
	pub to: String,
	/// Stroke and dot colour.
	#[serde(default)]
	pub color: Option<String>,
	/// Stroke width.
	#[serde(default)]
	pub width: Option<f64>,
	/// Fixed speed; wins over `speed`.
	#[serde(default)]
	pub factor: Option<f64>,
	/// Fixed speed.
	#[serde(default)]
	pub speed: Option<f64>,
	/// Explicit curvature; disables fan-out for this link.
	#[serde(default)]
	pub curve: Option<f64>,
	/// Signed flow entity; defaults to the source node's entity.
	#[serde(default)]
	pub flow_entity: Option<String>,
	/// Dead zone around zero.
	#[serde(default)]
	pub zero_threshold: Option<f64>,
}

/// Parse a `"row:col"` grid shorthand; the row may be fractional.
pub fn parse_grid(text: &str) -> Result<(f64, f64), ConfigError> {
	let invalid = || ConfigError::Grid(text.to_string());
	let (row, col) = text.trim().split_once(':').ok_or_else(invalid)?;
	let (row, col) = (row.trim(), col.trim());
	let row_ok = !row.is_empty()
		&& row.chars().all(|c| c.is_ascii_digit() || c == '.')
		&& row.matches('.').count() <= 1
		&& !row.starts_with('.')
		&& !row.ends_with('.');
	if !row_ok || col.is_empty() || !col.chars().all(|c| c.is_ascii_digit()) {
		return Err(invalid());
	}
	let row: f64 = row.parse().map_err(|_| invalid())?;
	let col: f64 = col.parse().map_err(|_| invalid())?;
	Ok((row, col))
}
