use leptos::prelude::*;

use crate::components::flow_network::{FlowConfig, FlowNetworkCanvas, Reading, Readings};

/// A small home-energy network: solar and grid feeding a house, battery and car.
const SAMPLE_CONFIG: &str = r##"{
	"background": "#14171a",
	"compute": { "unit_mode": "w_to_kw", "precision": 2 },
	"layout": {
		"columns": 3,
		"gap_x": 38,
		"gap_y": 26,
		"padding_x": 26,
		"padding_y": 20,
		"preferred_col_width": 180
	},
	"dot": { "size": 5, "glow": true, "fade_zone": 0.10 },
	"missing_behavior": "infer",
	"speed_mapping": {
		"enabled": true,
		"value_min": 0,
		"value_max": 5000,
		"speed_min": 0.25,
		"speed_max": 1.6
	},
	"nodes": [
		{
			"id": "solar", "label": "Solar", "entity": "sensor.solar_power",
			"shape": "circle", "ring": "#f5c542", "icon": "mdi:solar-power"
		},
		{
			"id": "grid", "label": "Grid", "entity": "sensor.grid_power",
			"ring": "#5da3f4", "icon": "mdi:transmission-tower"
		},
		{
			"id": "house", "label": "House", "grid": "2:2",
			"entity": "sensor.house_power", "subtract": "sensor.car_power",
			"ring": "#2dd4bf", "icon": "mdi:home"
		},
		{
			"id": "battery", "label": "Battery", "entity": "sensor.battery_power",
			"shape": "square", "ring": "#a3e635", "icon": "mdi:battery"
		},
		{
			"id": "car", "label": "EV", "entity": "sensor.car_power",
			"ring": "#f97316", "row": 2.5, "col": 3
		}
	],
	"links": [
		{ "from": "solar", "to": "house", "color": "#f5c542" },
		{ "from": "grid", "to": "house", "color": "#5da3f4", "zero_threshold": 20 },
		{
			"from": "house", "to": "battery", "color": "#a3e635",
			"flow_entity": "sensor.battery_power"
		},
		{ "from": "house", "to": "car", "color": "#f97316", "flow_entity": "sensor.car_power" }
	]
}"##;

fn sample_readings() -> Readings {
	Readings::new()
		.with("sensor.solar_power", Reading::number(3420.0, Some("W")))
		.with("sensor.grid_power", Reading::number(-860.0, Some("W")))
		.with("sensor.house_power", Reading::number(4100.0, Some("W")))
		.with("sensor.battery_power", Reading::number(-1250.0, Some("W")))
		.with("sensor.car_power", Reading::number(2200.0, Some("W")))
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let readings = Signal::derive(sample_readings);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="flow-card">
				<h1>"Energy Flow"</h1>
				{FlowConfig::from_json(SAMPLE_CONFIG)
					.map(|config| view! { <FlowNetworkCanvas config=config readings=readings /> })}
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sample_config_parses() {
		let config = FlowConfig::from_json(SAMPLE_CONFIG).unwrap();
		assert_eq!(config.nodes.len(), 5);
		assert_eq!(config.links.len(), 4);
		assert_eq!(config.nodes[2].grid.as_deref(), Some("2:2"));
	}
}
