//! Per-frame driver: visibility skip, redraw invalidation and phase advance.

use log::{debug, warn};

use super::readings::Readings;
use super::resolver::Direction;
use super::scene::{DotStyle, FrameSurface};
use super::state::FlowState;
use super::types::FlowConfig;

/// Assumed frame interval when there is no previous timestamp.
pub const FALLBACK_FRAME_MS: f64 = 16.0;

/// Advance a phase by `dt_ms` at `speed` curve lengths per second, wrapped to [0, 1).
pub fn advance_phase(phase: f64, dt_ms: f64, speed: f64) -> f64 {
	let next = (phase + dt_ms / 1000.0 * speed).rem_euclid(1.0);
	if next.is_finite() && next < 1.0 { next } else { 0.0 }
}

/// Position along the curve: reverse flow runs from `to` back to `from`.
pub fn travel(phase: f64, direction: Direction) -> f64 {
	match direction {
		Direction::Reverse => 1.0 - phase,
		Direction::Forward | Direction::Stopped => phase,
	}
}

/// Fade in over the first `fade_zone` of the path and out over the last.
pub fn fade_alpha(t: f64, fade_zone: f64) -> f64 {
	let alpha = if t < fade_zone {
		t / fade_zone
	} else if t > 1.0 - fade_zone {
		(1.0 - t) / fade_zone
	} else {
		1.0
	};
	alpha.clamp(0.0, 1.0)
}

/// Whether frames are being issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
	/// Detached; ticks are no-ops.
	#[default]
	Stopped,
	/// Attached; every tick draws.
	Running,
}

/// How stale the cached layout and static layer are, least to most.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Invalidation {
	/// Only the animated layer needs drawing.
	Clean,
	/// Value text or geometry changed.
	NeedsStaticRedraw,
	/// Node positions are stale.
	NeedsLayout,
}

/// An event that may change [`Invalidation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidationRequest {
	/// New nodes or links.
	ConfigChanged,
	/// New surface size.
	Resized,
	/// New readings.
	DataChanged,
	/// Layout has just run.
	LayoutApplied,
	/// The static layer has just been painted.
	StaticDrawn,
}

impl Invalidation {
	/// The state after `request`.
	pub fn transition(self, request: InvalidationRequest) -> Self {
		use InvalidationRequest::*;
		match request {
			ConfigChanged | Resized => Invalidation::NeedsLayout,
			DataChanged => self.max(Invalidation::NeedsStaticRedraw),
			LayoutApplied => Invalidation::NeedsStaticRedraw,
			StaticDrawn if self == Invalidation::NeedsStaticRedraw => Invalidation::Clean,
			StaticDrawn => self,
		}
	}
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
	/// The scheduler is stopped.
	Idle,
	/// The surface is hidden; only the timestamp was recorded.
	Hidden,
	/// No nonzero surface size has been observed yet.
	AwaitingSize,
	/// The animated layer was drawn.
	Drawn {
		/// The static layer was repainted too.
		static_redrawn: bool,
		/// Dots on the animated layer.
		dots: usize,
	},
}

/// Owns one widget's [`FlowState`] and decides what each frame draws.
#[derive(Debug)]
pub struct RenderScheduler {
	state: FlowState,
	run: RunState,
	invalidation: Invalidation,
	surface_size: Option<(f64, f64)>,
	last_ts: Option<f64>,
}

impl RenderScheduler {
	/// A stopped scheduler that will lay out on its first sized tick.
	pub fn new(config: FlowConfig) -> Self {
		Self {
			state: FlowState::new(config),
			run: RunState::Stopped,
			invalidation: Invalidation::NeedsLayout,
			surface_size: None,
			last_ts: None,
		}
	}

	/// Current layout and animation state.
	pub fn state(&self) -> &FlowState {
		&self.state
	}

	/// Whether frames are being issued.
	pub fn run_state(&self) -> RunState {
		self.run
	}

	/// What the next tick has to rebuild.
	pub fn invalidation(&self) -> Invalidation {
		self.invalidation
	}

	fn request(&mut self, request: InvalidationRequest) {
		self.invalidation = self.invalidation.transition(request);
	}

	/// Attach: begin issuing frames.
	pub fn start(&mut self) {
		if self.run == RunState::Stopped {
			debug!("flow scheduler started");
			self.run = RunState::Running;
			self.last_ts = None;
		}
	}

	/// Detach: stop issuing frames.
	pub fn stop(&mut self) {
		if self.run == RunState::Running {
			debug!("flow scheduler stopped");
			self.run = RunState::Stopped;
		}
	}

	/// Replace the node and link set; phases restart from zero.
	pub fn set_config(&mut self, config: FlowConfig) {
		self.state = FlowState::new(config);
		self.request(InvalidationRequest::ConfigChanged);
	}

	/// Record a new surface size. Zero sizes are ignored until a real one arrives.
	pub fn resize(&mut self, width: f64, height: f64) {
		if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
			debug!("deferring layout, surface is {width}x{height}");
			return;
		}
		self.surface_size = Some((width, height));
		for link in self.state.links.iter_mut() {
			link.path = None;
		}
		self.request(InvalidationRequest::Resized);
	}

	/// New readings arrived; value text needs repainting.
	pub fn data_changed(&mut self) {
		self.request(InvalidationRequest::DataChanged);
	}

	/// Height the host should give the surface, when auto height is on.
	pub fn content_height(&self) -> Option<f64> {
		if !self.state.config.layout.auto_height {
			return None;
		}
		self.state.metrics.map(|m| m.total_height)
	}

	/// Run one animation frame at timestamp `ts_ms`.
	pub fn tick(
		&mut self,
		ts_ms: f64,
		visible: bool,
		readings: &Readings,
		surface: &mut dyn FrameSurface,
	) -> FrameOutcome {
		if self.run == RunState::Stopped {
			return FrameOutcome::Idle;
		}
		if !visible {
			self.last_ts = Some(ts_ms);
			return FrameOutcome::Hidden;
		}
		let dt = match self.last_ts {
			Some(prev) => (ts_ms - prev).max(0.0),
			None => FALLBACK_FRAME_MS,
		};
		self.last_ts = Some(ts_ms);

		if self.invalidation == Invalidation::NeedsLayout {
			let Some((width, height)) = self.surface_size else {
				return FrameOutcome::AwaitingSize;
			};
			let m = self.state.apply_layout(width, height);
			debug!(
				"layout {}x{} grid, cell {:.1}px, content height {:.1}px",
				m.columns, m.rows, m.cell_width, m.total_height
			);
			self.request(InvalidationRequest::LayoutApplied);
		}

		let mut static_redrawn = false;
		if self.invalidation == Invalidation::NeedsStaticRedraw {
			self.state.update_geometry();
			let scene = self.state.static_scene(readings);
			match surface.draw_static(&scene) {
				Ok(()) => {
					static_redrawn = true;
					self.request(InvalidationRequest::StaticDrawn);
				}
				Err(err) => warn!("static layer redraw failed: {err}"),
			}
		}

		self.state.resolve_links(readings);
		let style = DotStyle {
			radius: self.state.config.dot.radius(),
			glow: self.state.config.dot.glow,
		};
		let dots = self.state.advance(dt);
		let count = dots.len();
		if let Err(err) = surface.draw_animated(&dots, style) {
			warn!("animated layer redraw failed: {err}");
		}

		FrameOutcome::Drawn {
			static_redrawn,
			dots: count,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_network::error::RenderError;
	use crate::components::flow_network::readings::Reading;
	use crate::components::flow_network::scene::{DotSprite, StaticScene};

	const EPS: f64 = 1e-9;

	#[test]
	fn test_phase_wraps() {
		let p = advance_phase(0.9, 250.0, 1.0);
		assert!((p - 0.15).abs() < EPS);
		assert!((0.0..1.0).contains(&p));
		assert_eq!(advance_phase(0.5, 500.0, 1.0), 0.0);
		assert!((advance_phase(0.2, 3000.0, 1.1) - 0.5).abs() < EPS);
		assert_eq!(advance_phase(0.3, f64::NAN, 1.0), 0.0);
		assert_eq!(advance_phase(0.3, 16.0, 0.0), 0.3);
	}

	#[test]
	fn test_travel() {
		assert_eq!(travel(0.25, Direction::Forward), 0.25);
		assert_eq!(travel(0.25, Direction::Reverse), 0.75);
	}

	#[test]
	fn test_fade() {
		assert!((fade_alpha(0.05, 0.10) - 0.5).abs() < EPS);
		assert!((fade_alpha(0.95, 0.10) - 0.5).abs() < EPS);
		assert_eq!(fade_alpha(0.5, 0.10), 1.0);
		assert_eq!(fade_alpha(0.0, 0.10), 0.0);
	}

	#[test]
	fn test_invalidation_transitions() {
		use Invalidation::*;
		use InvalidationRequest::*;
		assert_eq!(Clean.transition(DataChanged), NeedsStaticRedraw);
		assert_eq!(NeedsLayout.transition(DataChanged), NeedsLayout);
		assert_eq!(Clean.transition(Resized), NeedsLayout);
		assert_eq!(NeedsStaticRedraw.transition(ConfigChanged), NeedsLayout);
		assert_eq!(NeedsLayout.transition(LayoutApplied), NeedsStaticRedraw);
		assert_eq!(NeedsStaticRedraw.transition(StaticDrawn), Clean);
		assert_eq!(NeedsLayout.transition(StaticDrawn), NeedsLayout);
	}

	struct NullSurface;

	impl FrameSurface for NullSurface {
		fn draw_static(&mut self, _scene: &StaticScene) -> Result<(), RenderError> {
			Ok(())
		}

		fn draw_animated(
			&mut self,
			_dots: &[DotSprite<'_>],
			_style: DotStyle,
		) -> Result<(), RenderError> {
			Ok(())
		}
	}

	#[test]
	fn test_start_stop() {
		let config = FlowConfig::from_json(
			r#"{
				"nodes": [ { "id": "a", "entity": "sensor.a" }, { "id": "b" } ],
				"links": [ { "from": "a", "to": "b" } ]
			}"#,
		)
		.unwrap();
		let readings = Readings::new().with("sensor.a", Reading::number(500.0, None));
		let mut s = RenderScheduler::new(config);
		assert_eq!(s.run_state(), RunState::Stopped);
		s.start();
		assert_eq!(s.run_state(), RunState::Running);
		s.resize(400.0, 200.0);
		s.tick(1000.0, true, &readings, &mut NullSurface);
		s.tick(1100.0, true, &readings, &mut NullSurface);
		let before = s.state().links[0].phase;
		assert!((before - 0.116).abs() < EPS);

		s.stop();
		assert_eq!(s.run_state(), RunState::Stopped);
		assert_eq!(s.tick(1200.0, true, &readings, &mut NullSurface), FrameOutcome::Idle);
		assert_eq!(s.state().links[0].phase, before);

		// re-attach forgets the old timestamp; the first frame advances by the fallback
		s.start();
		s.tick(9000.0, true, &readings, &mut NullSurface);
		let step = s.state().links[0].phase - before;
		assert!((step - FALLBACK_FRAME_MS / 1000.0).abs() < EPS);
	}

	#[test]
	fn test_zero_resize_deferred() {
		let mut s = RenderScheduler::new(FlowConfig::default());
		s.resize(0.0, 0.0);
		assert_eq!(s.surface_size, None);
		s.resize(300.0, 200.0);
		assert_eq!(s.surface_size, Some((300.0, 200.0)));
		assert_eq!(s.invalidation(), Invalidation::NeedsLayout);
	}
}
