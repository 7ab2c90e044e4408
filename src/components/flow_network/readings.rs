//! Live entity values supplied by the host, and the per-node value text built from them.

use std::collections::HashMap;

use serde::Deserialize;

use super::types::{ComputeConfig, Term, UnitMode};

/// A raw entity state: numeric, or an opaque string such as `"unavailable"`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawValue {
	/// A number.
	Number(f64),
	/// Anything else, shown verbatim.
	Text(String),
}

/// One entity's current state and display unit.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Reading {
	/// Raw state.
	pub state: RawValue,
	/// Display unit, e.g. `W`.
	#[serde(default)]
	pub unit: Option<String>,
}

impl Reading {
	/// A numeric reading.
	pub fn number(value: f64, unit: Option<&str>) -> Self {
		Self {
			state: RawValue::Number(value),
			unit: unit.map(str::to_string),
		}
	}

	/// A string reading.
	pub fn text(value: &str) -> Self {
		Self {
			state: RawValue::Text(value.to_string()),
			unit: None,
		}
	}

	/// Finite numeric value, parsing numeric strings.
	pub fn as_number(&self) -> Option<f64> {
		let value = match &self.state {
			RawValue::Number(v) => *v,
			RawValue::Text(s) => {
				let s = s.trim();
				if s.is_empty() {
					return None;
				}
				s.parse::<f64>().ok()?
			}
		};
		value.is_finite().then_some(value)
	}
}

/// Snapshot of the host's data store, keyed by entity id.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Readings {
	values: HashMap<String, Reading>,
}

impl Readings {
	/// An empty snapshot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set or replace one entity.
	pub fn insert(&mut self, entity: impl Into<String>, reading: Reading) {
		self.values.insert(entity.into(), reading);
	}

	/// Builder form of [`Readings::insert`].
	pub fn with(mut self, entity: impl Into<String>, reading: Reading) -> Self {
		self.insert(entity, reading);
		self
	}

	/// Look up one entity.
	pub fn get(&self, entity: &str) -> Option<&Reading> {
		self.values.get(entity)
	}

	/// Finite numeric value of one entity, if it has one.
	pub fn number(&self, entity: &str) -> Option<f64> {
		self.get(entity).and_then(Reading::as_number)
	}

	/// Evaluate an arithmetic operand; list members that do not resolve count as zero.
	pub fn term(&self, term: &Term) -> Option<f64> {
		match term {
			Term::Number(v) => v.is_finite().then_some(*v),
			Term::Text(s) => match s.trim().parse::<f64>() {
				Ok(v) if v.is_finite() => Some(v),
				_ => self.number(s),
			},
			Term::List(items) => Some(items.iter().filter_map(|t| self.term(t)).sum()),
		}
	}
}

/// Node value after `add`/`subtract`, before unit conversion.
pub fn apply_terms(
	readings: &Readings,
	base: f64,
	add: Option<&Term>,
	subtract: Option<&Term>,
) -> f64 {
	let mut value = base;
	if let Some(v) = add.and_then(|t| readings.term(t)) {
		value += v;
	}
	if let Some(v) = subtract.and_then(|t| readings.term(t)) {
		value -= v;
	}
	value
}

/// Format a numeric node value with the global unit conversion and precision.
pub fn format_value(
	value: f64,
	unit: Option<&str>,
	compute: &ComputeConfig,
	precision: u32,
) -> String {
	let (value, mut unit) = match compute.unit_mode {
		UnitMode::Keep => (value, unit.map(|u| format!(" {u}")).unwrap_or_default()),
		UnitMode::WToKw => (value * 0.001, " kW".to_string()),
	};
	if let Some(suffix) = compute.suffix.as_deref().filter(|s| !s.is_empty()) {
		unit = format!(" {suffix}");
	}
	let precision = compute.precision.unwrap_or(precision) as usize;
	format!("{value:.precision$}{unit}")
}
