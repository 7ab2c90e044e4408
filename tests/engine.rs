//! Drives the render scheduler headlessly through a recording surface.

use flow_network_canvas::components::flow_network::scene::{
	DotSprite, DotStyle, FrameSurface, StaticScene,
};
use flow_network_canvas::components::flow_network::scheduler::RunState;
use flow_network_canvas::components::flow_network::{
	Direction, FlowConfig, FrameOutcome, Reading, Readings, RenderError, RenderScheduler,
};

#[derive(Default)]
struct Recorder {
	statics: Vec<StaticScene>,
	frames: Vec<Vec<(f64, f64, f64)>>,
	fail: bool,
}

impl FrameSurface for Recorder {
	fn draw_static(&mut self, scene: &StaticScene) -> Result<(), RenderError> {
		if self.fail {
			return Err(RenderError::Canvas("lost context".into()));
		}
		self.statics.push(scene.clone());
		Ok(())
	}

	fn draw_animated(
		&mut self,
		dots: &[DotSprite<'_>],
		_style: DotStyle,
	) -> Result<(), RenderError> {
		if self.fail {
			return Err(RenderError::Canvas("lost context".into()));
		}
		self.frames
			.push(dots.iter().map(|d| (d.position.x, d.position.y, d.alpha)).collect());
		Ok(())
	}
}

const NETWORK: &str = r#"{
	"layout": { "columns": 3, "responsive": false },
	"nodes": [
		{ "id": "pv", "entity": "sensor.pv" },
		{ "id": "house" },
		{ "id": "grid", "entity": "sensor.grid" }
	],
	"links": [
		{ "from": "pv", "to": "house" },
		{ "from": "grid", "to": "house" }
	]
}"#;

fn scheduler() -> RenderScheduler {
	RenderScheduler::new(FlowConfig::from_json(NETWORK).unwrap())
}

fn readings(pv: f64, grid: f64) -> Readings {
	Readings::new()
		.with("sensor.pv", Reading::number(pv, Some("W")))
		.with("sensor.grid", Reading::number(grid, Some("W")))
}

#[test]
fn test_idle_until_started() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	assert_eq!(s.tick(0.0, true, &readings(1.0, 1.0), &mut surface), FrameOutcome::Idle);
	assert!(surface.statics.is_empty());
	assert!(surface.frames.is_empty());
}

#[test]
fn test_awaits_size_then_draws() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	let data = readings(500.0, 200.0);
	s.start();
	assert_eq!(s.tick(0.0, true, &data, &mut surface), FrameOutcome::AwaitingSize);
	s.resize(0.0, 0.0);
	assert_eq!(s.tick(16.0, true, &data, &mut surface), FrameOutcome::AwaitingSize);

	s.resize(600.0, 300.0);
	assert_eq!(
		s.tick(32.0, true, &data, &mut surface),
		FrameOutcome::Drawn { static_redrawn: true, dots: 2 }
	);
	assert_eq!(surface.statics.len(), 1);
	assert_eq!(surface.statics[0].nodes.len(), 3);
	assert_eq!(surface.statics[0].links.len(), 2);
}

#[test]
fn test_static_layer_redrawn_only_when_invalidated() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	let data = readings(500.0, 200.0);
	s.start();
	s.resize(600.0, 300.0);
	for ts in [0.0, 16.0, 32.0, 48.0] {
		s.tick(ts, true, &data, &mut surface);
	}
	assert_eq!(surface.statics.len(), 1);
	assert_eq!(surface.frames.len(), 4);

	s.data_changed();
	assert_eq!(
		s.tick(64.0, true, &data, &mut surface),
		FrameOutcome::Drawn { static_redrawn: true, dots: 2 }
	);
	s.resize(640.0, 300.0);
	s.tick(80.0, true, &data, &mut surface);
	assert_eq!(surface.statics.len(), 3);
	assert!(surface.statics[2].width > surface.statics[1].width);
}

#[test]
fn test_hidden_frames_skip_drawing() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	let data = readings(500.0, 200.0);
	s.start();
	s.resize(600.0, 300.0);
	s.tick(0.0, true, &data, &mut surface);
	let before = s.state().links[0].phase;

	assert_eq!(s.tick(5000.0, false, &data, &mut surface), FrameOutcome::Hidden);
	assert_eq!(surface.frames.len(), 1);
	assert_eq!(s.state().links[0].phase, before);

	// the hidden stretch is not replayed on return
	s.tick(5016.0, true, &data, &mut surface);
	let step = s.state().links[0].phase - before;
	assert!((step - 0.016).abs() < 1e-9);
}

#[test]
fn test_first_frame_uses_fallback_interval() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	s.start();
	s.resize(600.0, 300.0);
	s.tick(123_456.0, true, &readings(500.0, 200.0), &mut surface);
	assert!((s.state().links[0].phase - 0.016).abs() < 1e-9);
}

#[test]
fn test_only_moving_links_emit_dots() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	s.start();
	s.resize(600.0, 300.0);
	let outcome = s.tick(0.0, true, &readings(500.0, 0.0), &mut surface);
	assert_eq!(outcome, FrameOutcome::Drawn { static_redrawn: true, dots: 1 });
	assert_eq!(s.state().links[1].direction, Direction::Stopped);
	assert_eq!(s.state().links[1].phase, 0.0);

	let quiet = Readings::new().with("sensor.pv", Reading::text("unavailable"));
	let outcome = s.tick(16.0, true, &quiet, &mut surface);
	assert_eq!(outcome, FrameOutcome::Drawn { static_redrawn: false, dots: 0 });
	assert!(surface.frames.last().is_some_and(Vec::is_empty));
}

#[test]
fn test_reverse_flow_starts_at_far_end() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	s.start();
	s.resize(600.0, 300.0);
	s.tick(0.0, true, &readings(-500.0, 0.0), &mut surface);
	assert_eq!(s.state().links[0].direction, Direction::Reverse);

	let path = s.state().links[0].path.unwrap();
	let (x, _, _) = surface.frames[0][0];
	// pv sits left of house, so a reverse dot begins near the house border
	assert!((x - path.end.x).abs() < (x - path.start.x).abs());
}

#[test]
fn test_surface_errors_do_not_stop_the_loop() {
	let mut s = scheduler();
	let mut surface = Recorder {
		fail: true,
		..Recorder::default()
	};
	let data = readings(500.0, 200.0);
	s.start();
	s.resize(600.0, 300.0);
	assert_eq!(
		s.tick(0.0, true, &data, &mut surface),
		FrameOutcome::Drawn { static_redrawn: false, dots: 2 }
	);
	assert_eq!(s.run_state(), RunState::Running);

	surface.fail = false;
	assert_eq!(
		s.tick(16.0, true, &data, &mut surface),
		FrameOutcome::Drawn { static_redrawn: true, dots: 2 }
	);
}

#[test]
fn test_config_swap_resets_phases() {
	let mut s = scheduler();
	let mut surface = Recorder::default();
	let data = readings(500.0, 200.0);
	s.start();
	s.resize(600.0, 300.0);
	s.tick(0.0, true, &data, &mut surface);
	assert!(s.state().links[0].phase > 0.0);

	s.set_config(FlowConfig::from_json(NETWORK).unwrap());
	assert_eq!(s.state().links[0].phase, 0.0);
	assert_eq!(
		s.tick(16.0, true, &data, &mut surface),
		FrameOutcome::Drawn { static_redrawn: true, dots: 2 }
	);
}
