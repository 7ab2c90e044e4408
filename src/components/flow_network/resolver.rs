//! Live value to animation direction and speed.

use super::readings::Readings;
use super::state::{Link, Node};
use super::types::{MissingBehavior, SpeedMapping};

/// Which way a link's dot travels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
	/// From `from` to `to`.
	Forward,
	/// From `to` back to `from`.
	Reverse,
	/// No dot.
	#[default]
	Stopped,
}

/// A link's motion for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
	/// Travel direction.
	pub direction: Direction,
	/// Path lengths per second.
	pub speed: f64,
}

impl Resolution {
	/// No motion.
	pub const STOPPED: Resolution = Resolution {
		direction: Direction::Stopped,
		speed: 0.0,
	};
}

/// Direction for a signed value; unreadable or within the dead zone means stopped.
pub fn direction_for(value: Option<f64>, zero_threshold: f64) -> Direction {
	match value {
		Some(v) if v.abs() > zero_threshold => {
			if v > 0.0 {
				Direction::Forward
			} else {
				Direction::Reverse
			}
		}
		_ => Direction::Stopped,
	}
}

/// Map `|value|` from the value domain onto the speed range, clamped at both ends.
pub fn map_speed(magnitude: f64, mapping: &SpeedMapping) -> f64 {
	let (lo, hi) = (mapping.value_min, mapping.value_max);
	let t = if hi > lo {
		((magnitude - lo) / (hi - lo)).clamp(0.0, 1.0)
	} else if magnitude >= hi {
		1.0
	} else {
		0.0
	};
	mapping.speed_min + (mapping.speed_max - mapping.speed_min) * t
}

/// Direction and speed of `link` under the current readings.
pub fn resolve(
	link: &Link,
	nodes: &[Node],
	readings: &Readings,
	missing: MissingBehavior,
	mapping: &SpeedMapping,
) -> Resolution {
	let (direction, value) = match &link.flow_entity {
		Some(entity) => {
			let value = readings.number(entity);
			(direction_for(value, link.zero_threshold), value)
		}
		None => match missing {
			MissingBehavior::Stop => return Resolution::STOPPED,
			// A single-ended reading carries no sign, so flow is forward-only.
			MissingBehavior::Infer => {
				let value = nodes[link.from].numeric_value(readings);
				let direction = match direction_for(value, link.zero_threshold) {
					Direction::Stopped => Direction::Stopped,
					_ => Direction::Forward,
				};
				(direction, value)
			}
		},
	};

	if direction == Direction::Stopped {
		return Resolution::STOPPED;
	}
	let speed = match value {
		Some(v) if mapping.enabled => map_speed(v.abs(), mapping),
		_ => link.speed_factor,
	};
	Resolution { direction, speed }
}
