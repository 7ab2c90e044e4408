//! Draw lists handed from the engine to a drawing surface.
//!
//! The engine never touches a canvas directly: it builds these plain values and a
//! [`FrameSurface`] turns them into pixels. Tests substitute a recording surface.

use super::error::RenderError;
use super::geometry::Point;
use super::types::Shape;

/// Which side of its node a label sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelSide {
	/// Above the shape.
	#[default]
	Top,
	/// Below the shape, when the node's links mostly leave upward.
	Bottom,
}

/// One link stroke between two node borders.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkStroke {
	/// Point on the source border.
	pub start: Point,
	/// Point on the target border.
	pub end: Point,
	/// Present only for curved links.
	pub control: Option<Point>,
	/// Stroke colour.
	pub color: String,
	/// Stroke width.
	pub width: f64,
}

/// One node: shape, ring, label and value text.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeGlyph {
	/// Shape centre.
	pub center: Point,
	/// Outline.
	pub shape: Shape,
	/// Outer size in CSS pixels.
	pub size: f64,
	/// Ring colour.
	pub ring: String,
	/// Ring stroke width.
	pub ring_width: f64,
	/// Fill colour.
	pub fill: String,
	/// Caption.
	pub label: String,
	/// Caption side.
	pub label_side: LabelSide,
	/// Caption font size.
	pub font_size: f64,
	/// Value text colour.
	pub text_color: String,
	/// Formatted value; empty draws nothing.
	pub value_text: String,
	/// Baseline of the value text.
	pub value_y: f64,
}

/// Everything on the redraw-on-invalidation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticScene {
	/// Surface width the scene was laid out for.
	pub width: f64,
	/// Surface height the scene was laid out for.
	pub height: f64,
	/// `None` clears to transparent.
	pub background: Option<String>,
	/// CSS font family for all text.
	pub font_family: String,
	/// Links, drawn first.
	pub links: Vec<LinkStroke>,
	/// Nodes, drawn over the links.
	pub nodes: Vec<NodeGlyph>,
}

/// One moving dot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotSprite<'a> {
	/// Current position on the link path.
	pub position: Point,
	/// Fade near the ends.
	pub alpha: f64,
	/// The link's colour.
	pub color: &'a str,
}

/// Style shared by every dot in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotStyle {
	/// Radius in CSS pixels.
	pub radius: f64,
	/// Shadow glow on or off.
	pub glow: bool,
}

/// A two-layer drawing target.
pub trait FrameSurface {
	/// Repaint the static layer from scratch.
	fn draw_static(&mut self, scene: &StaticScene) -> Result<(), RenderError>;

	/// Clear the animated layer and paint the given dots.
	fn draw_animated(&mut self, dots: &[DotSprite<'_>], style: DotStyle) -> Result<(), RenderError>;
}
