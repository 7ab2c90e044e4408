use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::error::RenderError;
use super::scene::{DotSprite, DotStyle, FrameSurface, LabelSide, NodeGlyph, StaticScene};
use super::types::Shape;

const LABEL_COLOR: &str = "rgba(255,255,255,0.9)";
const LABEL_GAP: f64 = 8.0;
const RING_GLOW: f64 = 18.0;
const DOT_GLOW: f64 = 8.0;

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, RenderError> {
	canvas
		.get_context("2d")?
		.ok_or(RenderError::NoContext)?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| RenderError::NoContext)
}

/// Two stacked canvases: static content below, moving dots above.
pub struct CanvasSurface {
	background: HtmlCanvasElement,
	foreground: HtmlCanvasElement,
	bg: CanvasRenderingContext2d,
	fg: CanvasRenderingContext2d,
	width: f64,
	height: f64,
}

impl CanvasSurface {
	/// Wrap the static (`background`) and animated (`foreground`) canvases.
	pub fn new(
		background: HtmlCanvasElement,
		foreground: HtmlCanvasElement,
	) -> Result<Self, RenderError> {
		let bg = context_2d(&background)?;
		let fg = context_2d(&foreground)?;
		Ok(Self {
			background,
			foreground,
			bg,
			fg,
			width: 0.0,
			height: 0.0,
		})
	}

	/// Size both backing stores for `width` x `height` CSS pixels at `dpr`.
	pub fn resize(&mut self, width: f64, height: f64, dpr: f64) -> Result<(), RenderError> {
		let dpr = dpr.max(1.0);
		self.width = width;
		self.height = height;
		for (canvas, ctx) in [(&self.background, &self.bg), (&self.foreground, &self.fg)] {
			canvas.set_width((width * dpr).floor().max(1.0) as u32);
			canvas.set_height((height * dpr).floor().max(1.0) as u32);
			ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
		}
		Ok(())
	}
}

impl FrameSurface for CanvasSurface {
	fn draw_static(&mut self, scene: &StaticScene) -> Result<(), RenderError> {
		let ctx = &self.bg;
		ctx.clear_rect(0.0, 0.0, self.width, self.height);
		if let Some(background) = &scene.background {
			ctx.set_fill_style_str(background);
			ctx.fill_rect(0.0, 0.0, self.width, self.height);
		}

		for link in &scene.links {
			ctx.save();
			ctx.set_stroke_style_str(&link.color);
			ctx.set_line_width(link.width);
			ctx.begin_path();
			ctx.move_to(link.start.x, link.start.y);
			match link.control {
				Some(c) => ctx.quadratic_curve_to(c.x, c.y, link.end.x, link.end.y),
				None => ctx.line_to(link.end.x, link.end.y),
			}
			ctx.stroke();
			ctx.restore();
		}

		for node in &scene.nodes {
			draw_node(ctx, node, &scene.font_family)?;
		}
		Ok(())
	}

	fn draw_animated(
		&mut self,
		dots: &[DotSprite<'_>],
		style: DotStyle,
	) -> Result<(), RenderError> {
		let ctx = &self.fg;
		ctx.clear_rect(0.0, 0.0, self.width, self.height);
		for dot in dots {
			ctx.save();
			ctx.set_global_alpha(dot.alpha);
			if style.glow {
				ctx.set_shadow_color(dot.color);
				ctx.set_shadow_blur(DOT_GLOW);
			}
			ctx.set_fill_style_str(dot.color);
			ctx.begin_path();
			let drawn = ctx.arc(dot.position.x, dot.position.y, style.radius, 0.0, 2.0 * PI);
			ctx.fill();
			ctx.restore();
			drawn?;
		}
		Ok(())
	}
}

fn trace_shape(ctx: &CanvasRenderingContext2d, node: &NodeGlyph) -> Result<(), RenderError> {
	let (cx, cy) = (node.center.x, node.center.y);
	let r = node.size / 2.0;
	ctx.begin_path();
	match node.shape {
		Shape::Circle => ctx.arc(cx, cy, r, 0.0, 2.0 * PI)?,
		Shape::Square => ctx.rect(cx - r, cy - r, node.size, node.size),
		Shape::Rounded => {
			let rad = node.shape.corner_radius(r);
			let (x, y, s) = (cx - r, cy - r, node.size);
			ctx.move_to(x + rad, y);
			ctx.arc_to(x + s, y, x + s, y + s, rad)?;
			ctx.arc_to(x + s, y + s, x, y + s, rad)?;
			ctx.arc_to(x, y + s, x, y, rad)?;
			ctx.arc_to(x, y, x + s, y, rad)?;
			ctx.close_path();
		}
	}
	Ok(())
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &NodeGlyph,
	font_family: &str,
) -> Result<(), RenderError> {
	let r = node.size / 2.0;

	ctx.save();
	ctx.set_shadow_color(&node.ring);
	ctx.set_shadow_blur(RING_GLOW);
	ctx.set_line_width(node.ring_width);
	ctx.set_stroke_style_str(&node.ring);
	let ring = trace_shape(ctx, node);
	ctx.stroke();
	ctx.restore();
	ring?;

	ctx.save();
	ctx.set_fill_style_str(&node.fill);
	let fill = trace_shape(ctx, node);
	ctx.fill();
	ctx.restore();
	fill?;

	let (label_y, baseline) = match node.label_side {
		LabelSide::Top => (node.center.y - r - LABEL_GAP, "bottom"),
		LabelSide::Bottom => (node.center.y + r + LABEL_GAP, "top"),
	};
	ctx.save();
	ctx.set_text_align("center");
	ctx.set_text_baseline(baseline);
	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.set_font(&format!("bold {}px {}", node.font_size, font_family));
	let label = ctx.fill_text(&node.label, node.center.x, label_y);
	ctx.restore();
	label?;

	if node.value_text.is_empty() {
		return Ok(());
	}
	ctx.save();
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&node.text_color);
	ctx.set_font(&format!("bold {}px {}", node.font_size.max(12.0), font_family));
	let value = ctx.fill_text(&node.value_text, node.center.x, node.value_y);
	ctx.restore();
	value?;
	Ok(())
}
