//! Normalised nodes and links, and the per-widget state the scheduler steps.

use std::collections::HashMap;

use log::{debug, warn};

use super::fanout::fan_offsets;
use super::geometry::{Point, curve_control, curve_point, edge_point};
use super::layout::{LayoutMetrics, layout};
use super::readings::{RawValue, Readings, apply_terms, format_value};
use super::resolver::{Direction, resolve};
use super::scene::{DotSprite, LabelSide, LinkStroke, NodeGlyph, StaticScene};
use super::scheduler::{advance_phase, fade_alpha, travel};
use super::types::{FlowConfig, LinkConfig, NodeConfig, Shape, Term, parse_grid};

const DEFAULT_RING: &str = "#23b0ff";
const DEFAULT_FILL: &str = "#121418";
const DEFAULT_ICON_COLOR: &str = "#ffffff";
const DEFAULT_LINK_COLOR: &str = "rgba(255,255,255,0.85)";

/// Row/column override; both absent means the node is placed automatically.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Placement {
	/// 1-based, may be fractional.
	pub row: Option<f64>,
	/// 1-based.
	pub col: Option<u32>,
}

impl Placement {
	/// Either part set.
	pub fn is_pinned(&self) -> bool {
		self.row.is_some() || self.col.is_some()
	}
}

/// Sizes the config fixed; `None` means derived from the cell size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExplicitSizes {
	/// Outer size, floored at 44.
	pub size: Option<f64>,
	/// Icon size.
	pub icon: Option<f64>,
	/// Label font size.
	pub font: Option<f64>,
}

/// A node with defaults applied, plus its laid-out geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique name links refer to.
	pub id: String,
	/// Caption.
	pub label: String,
	/// Entity whose value is shown.
	pub entity: Option<String>,
	/// Added to the entity value.
	pub add: Option<Term>,
	/// Subtracted from the entity value.
	pub subtract: Option<Term>,
	/// Outline.
	pub shape: Shape,
	/// Ring colour.
	pub ring: String,
	/// Ring stroke width, at least 2.
	pub ring_width: f64,
	/// Fill colour.
	pub fill: String,
	/// Value text colour.
	pub text_color: String,
	/// Placement order.
	pub order: i64,
	/// Icon name.
	pub icon: Option<String>,
	/// Icon colour.
	pub icon_color: String,
	/// Pinned cell, if any.
	pub placement: Placement,
	/// Sizes fixed by the config.
	pub explicit: ExplicitSizes,
	// Recomputed on every layout pass.
	/// Shape centre.
	pub center: Point,
	/// Outer size.
	pub size: f64,
	/// Icon size.
	pub icon_size: f64,
	/// Label font size.
	pub font_size: f64,
	/// Label side, from where the node's links go.
	pub label_side: LabelSide,
}

/// A numeric node value and its display text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeValue {
	/// Value after terms, before unit conversion.
	pub raw: Option<f64>,
	/// Formatted text, or the raw string state.
	pub text: String,
}

impl Node {
	/// Apply defaults to the `index`-th configured node.
	pub fn from_config(cfg: &NodeConfig, index: usize, text_color: &str) -> Self {
		let id = cfg.id.clone().unwrap_or_else(|| format!("n{index}"));
		let finite = |v: Option<f64>| v.filter(|v| v.is_finite());

		let (mut row, mut col) = (finite(cfg.row), finite(cfg.col));
		if row.is_none() || col.is_none() {
			if let Some(grid) = cfg.grid.as_deref() {
				match parse_grid(grid) {
					Ok((r, c)) => {
						row = Some(r);
						col = Some(c);
					}
					Err(err) => warn!("node `{id}`: {err}"),
				}
			}
		}

		Self {
			label: cfg.label.clone().unwrap_or_else(|| id.clone()),
			entity: cfg.entity.clone().filter(|e| !e.is_empty()),
			add: cfg.add.clone(),
			subtract: cfg.subtract.clone(),
			shape: cfg.shape,
			ring: cfg.ring.clone().unwrap_or_else(|| DEFAULT_RING.into()),
			ring_width: finite(cfg.ring_width).unwrap_or(3.0).max(2.0),
			fill: cfg.fill.clone().unwrap_or_else(|| DEFAULT_FILL.into()),
			text_color: cfg.color.clone().unwrap_or_else(|| text_color.into()),
			order: cfg.order.unwrap_or(index as i64),
			icon: cfg.icon.clone().filter(|i| !i.is_empty()),
			icon_color: cfg
				.icon_color
				.clone()
				.unwrap_or_else(|| DEFAULT_ICON_COLOR.into()),
			placement: Placement {
				row,
				col: col.map(|c| c.floor().max(1.0) as u32),
			},
			explicit: ExplicitSizes {
				size: finite(cfg.size).map(|s| s.max(44.0)),
				icon: finite(cfg.icon_size).map(|s| s.max(14.0)),
				font: finite(cfg.font_size).map(|s| s.max(11.0)),
			},
			center: Point::default(),
			size: 0.0,
			icon_size: 0.0,
			font_size: 0.0,
			label_side: LabelSide::Top,
			id,
		}
	}

	/// Entity value after `add`/`subtract`; a node without an entity but with terms
	/// evaluates them against zero.
	pub fn numeric_value(&self, readings: &Readings) -> Option<f64> {
		let base = match &self.entity {
			Some(entity) => readings.number(entity)?,
			None if self.add.is_some() || self.subtract.is_some() => 0.0,
			None => return None,
		};
		Some(apply_terms(
			readings,
			base,
			self.add.as_ref(),
			self.subtract.as_ref(),
		))
	}

	/// Display value; non-numeric states are shown verbatim.
	pub fn value(&self, readings: &Readings, config: &FlowConfig) -> NodeValue {
		let reading = self.entity.as_deref().and_then(|e| readings.get(e));
		if let Some(raw) = self.numeric_value(readings) {
			let unit = reading.and_then(|r| r.unit.as_deref());
			return NodeValue {
				raw: Some(raw),
				text: format_value(raw, unit, &config.compute, config.value_precision),
			};
		}
		match reading {
			Some(r) => NodeValue {
				raw: None,
				text: match &r.state {
					RawValue::Text(s) => s.clone(),
					RawValue::Number(v) => v.to_string(),
				},
			},
			None => NodeValue::default(),
		}
	}
}

/// Cached border-exact path of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkPath {
	/// Point on the source border.
	pub start: Point,
	/// Point on the target border.
	pub end: Point,
	/// Bezier control point; the chord midpoint when straight.
	pub control: Point,
	/// Draw as a curve.
	pub curved: bool,
}

impl LinkPath {
	/// Position at `t` in [0, 1] from `start`.
	pub fn point_at(&self, t: f64) -> Point {
		if self.curved {
			curve_point(self.start, self.control, self.end, t)
		} else {
			self.start.lerp(self.end, t)
		}
	}
}

/// A link with both endpoints resolved, plus its animation state.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Source node index.
	pub from: usize,
	/// Target node index.
	pub to: usize,
	/// Stroke and dot colour.
	pub color: String,
	/// Stroke width, at least 1.
	pub width: f64,
	/// Base speed in curve lengths per second, clamped to [0, 2].
	pub speed_factor: f64,
	/// Explicit curvature; `None` lets fan-out decide.
	pub curve: Option<f64>,
	/// Signed entity driving the dot.
	pub flow_entity: Option<String>,
	/// Dead zone around zero.
	pub zero_threshold: f64,
	/// Cached border-exact path; cleared on resize.
	pub path: Option<LinkPath>,
	/// Position along the path in [0, 1).
	pub phase: f64,
	/// Direction resolved this frame.
	pub direction: Direction,
	/// Speed resolved this frame.
	pub speed: f64,
}

/// The flow entity a link follows: its own, else its source node's.
pub fn resolve_flow_source(link: &LinkConfig, from: &Node) -> Option<String> {
	link.flow_entity
		.clone()
		.filter(|e| !e.is_empty())
		.or_else(|| from.entity.clone())
}

impl Link {
	/// Apply defaults to a configured link between two resolved nodes.
	pub fn from_config(cfg: &LinkConfig, from: usize, to: usize, from_node: &Node) -> Self {
		let factor = cfg
			.factor
			.or(cfg.speed)
			.filter(|v| v.is_finite())
			.unwrap_or(1.0);
		Self {
			from,
			to,
			color: cfg
				.color
				.clone()
				.unwrap_or_else(|| DEFAULT_LINK_COLOR.into()),
			width: cfg.width.filter(|w| w.is_finite()).unwrap_or(2.0).max(1.0),
			speed_factor: factor.clamp(0.0, 2.0),
			curve: cfg.curve.filter(|c| c.is_finite()),
			flow_entity: resolve_flow_source(cfg, from_node),
			zero_threshold: cfg
				.zero_threshold
				.filter(|v| v.is_finite())
				.unwrap_or(0.0)
				.max(0.0),
			path: None,
			phase: 0.0,
			direction: Direction::Stopped,
			speed: 0.0,
		}
	}
}

/// Per-widget layout and animation state, owned by one scheduler.
#[derive(Clone, Debug, Default)]
pub struct FlowState {
	/// Config the nodes and links came from.
	pub config: FlowConfig,
	/// Nodes in declaration order.
	pub nodes: Vec<Node>,
	/// Links whose endpoints both exist.
	pub links: Vec<Link>,
	/// Last layout, if any.
	pub metrics: Option<LayoutMetrics>,
	/// CSS pixel size the static layer was laid out for.
	pub width: f64,
	/// Content height with auto height, else the surface height.
	pub height: f64,
}

impl FlowState {
	/// Normalise `config`; links naming an unknown node are dropped.
	pub fn new(config: FlowConfig) -> Self {
		let nodes: Vec<Node> = config
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| Node::from_config(n, i, &config.node_text_color))
			.collect();

		let mut index: HashMap<&str, usize> = HashMap::new();
		for (i, node) in nodes.iter().enumerate() {
			if index.insert(node.id.as_str(), i).is_some() {
				warn!("duplicate node id `{}`, later node wins", node.id);
			}
		}

		let links = config
			.links
			.iter()
			.filter_map(|l| {
				match (index.get(l.from.as_str()), index.get(l.to.as_str())) {
					(Some(&from), Some(&to)) => Some(Link::from_config(l, from, to, &nodes[from])),
					_ => {
						debug!("dropping link {} -> {}: unknown node", l.from, l.to);
						None
					}
				}
			})
			.collect();

		Self {
			nodes,
			links,
			config,
			metrics: None,
			width: 0.0,
			height: 0.0,
		}
	}

	/// Node by id; with duplicates the later one wins.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().rev().find(|n| n.id == id)
	}

	/// Lay nodes out for a surface of `width` x `height` CSS pixels.
	pub fn apply_layout(&mut self, width: f64, height: f64) -> LayoutMetrics {
		let metrics = layout(&mut self.nodes, &self.config.layout, width);
		self.width = width;
		self.height = if self.config.layout.auto_height {
			metrics.total_height
		} else {
			height
		};
		self.metrics = Some(metrics);
		metrics
	}

	/// Recompute border endpoints, fan-out curvature and label sides.
	pub fn update_geometry(&mut self) {
		let fan = &self.config.link_fan_out;
		let offsets = fan_offsets(&self.links, &self.nodes);
		for (link, offset) in self.links.iter_mut().zip(offsets) {
			let (a, b) = (&self.nodes[link.from], &self.nodes[link.to]);
			let start = edge_point(a.center, a.shape, a.size, b.center);
			let end = edge_point(b.center, b.shape, b.size, a.center);
			let curve = match link.curve {
				Some(c) => c,
				None if fan.enabled => offset * fan.strength,
				None => 0.0,
			};
			link.path = Some(LinkPath {
				start,
				end,
				control: curve_control(start, end, curve),
				curved: curve != 0.0,
			});
		}
		self.update_label_sides();
	}

	fn update_label_sides(&mut self) {
		let mut sums = vec![(0.0f64, 0usize); self.nodes.len()];
		for link in &self.links {
			let (a, b) = (self.nodes[link.from].center, self.nodes[link.to].center);
			sums[link.from].0 += b.y - a.y;
			sums[link.from].1 += 1;
			sums[link.to].0 += a.y - b.y;
			sums[link.to].1 += 1;
		}
		for (node, (dy, count)) in self.nodes.iter_mut().zip(sums) {
			node.label_side = if count > 0 && dy < 0.0 {
				LabelSide::Bottom
			} else {
				LabelSide::Top
			};
		}
	}

	/// Refresh every link's direction and speed from the current readings.
	pub fn resolve_links(&mut self, readings: &Readings) {
		let missing = self.config.missing_behavior;
		for i in 0..self.links.len() {
			let r = resolve(
				&self.links[i],
				&self.nodes,
				readings,
				missing,
				&self.config.speed_mapping,
			);
			let link = &mut self.links[i];
			link.direction = r.direction;
			link.speed = r.speed;
		}
	}

	/// Advance moving links by `dt_ms` and return the dots to draw.
	pub fn advance(&mut self, dt_ms: f64) -> Vec<DotSprite<'_>> {
		let fade_zone = self.config.dot.effective_fade_zone();
		let mut dots = Vec::with_capacity(self.links.len());
		for link in self.links.iter_mut() {
			let Some(path) = link.path else {
				continue;
			};
			if link.direction == Direction::Stopped {
				continue;
			}
			link.phase = advance_phase(link.phase, dt_ms, link.speed);
			let link: &Link = link;
			let t = travel(link.phase, link.direction);
			dots.push(DotSprite {
				position: path.point_at(t),
				alpha: fade_alpha(t, fade_zone),
				color: link.color.as_str(),
			});
		}
		dots
	}

	/// Draw list for the static layer.
	pub fn static_scene(&self, readings: &Readings) -> StaticScene {
		let cfg = &self.config;
		let links = self
			.links
			.iter()
			.filter_map(|l| {
				let path = l.path?;
				Some(LinkStroke {
					start: path.start,
					end: path.end,
					control: path.curved.then_some(path.control),
					color: l.color.clone(),
					width: l.width,
				})
			})
			.collect();

		let nodes = self
			.nodes
			.iter()
			.map(|n| {
				let r = n.size / 2.0;
				let icon_h = if n.icon.is_some() { n.icon_size } else { 0.0 };
				let extra = 6.0_f64
					.max(cfg.value_offset_px)
					.max((n.size * 0.06).round());
				let value_y = (n.center.y + icon_h / 2.0 + extra).min(n.center.y + r - 6.0);
				NodeGlyph {
					center: n.center,
					shape: n.shape,
					size: n.size,
					ring: n.ring.clone(),
					ring_width: n.ring_width,
					fill: n.fill.clone(),
					label: n.label.clone(),
					label_side: n.label_side,
					font_size: n.font_size,
					text_color: n.text_color.clone(),
					value_text: n.value(readings, cfg).text,
					value_y,
				}
			})
			.collect();

		StaticScene {
			width: self.width,
			height: self.height,
			background: Some(cfg.background.clone())
				.filter(|b| !b.is_empty() && b != "transparent"),
			font_family: cfg.font_family.clone(),
			links,
			nodes,
		}
	}
}
