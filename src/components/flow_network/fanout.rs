//! Lateral separation of links that share an endpoint.

use std::cmp::Ordering;

use super::state::{Link, Node};

/// Signed sibling offset for every link, centred on zero within its group.
///
/// A link's group is every link leaving the same node or entering the same node,
/// itself included, ordered by where the non-shared endpoint sits (y, then x).
/// Links with an explicit curve get `0.0`; callers ignore it for them anyway.
pub fn fan_offsets(links: &[Link], nodes: &[Node]) -> Vec<f64> {
	links
		.iter()
		.enumerate()
		.map(|(own, link)| {
			if link.curve.is_some() {
				return 0.0;
			}
			let mut group: Vec<(usize, usize)> = links
				.iter()
				.enumerate()
				.filter(|(_, other)| other.from == link.from || other.to == link.to)
				.map(|(k, other)| {
					let far = if other.from == link.from { other.to } else { other.from };
					(k, far)
				})
				.collect();
			group.sort_by(|&(ka, a), &(kb, b)| {
				let (a, b) = (nodes[a].center, nodes[b].center);
				a.y.partial_cmp(&b.y)
					.unwrap_or(Ordering::Equal)
					.then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
					.then(ka.cmp(&kb))
			});
			let position = group.iter().position(|&(k, _)| k == own).unwrap_or(0);
			position as f64 - (group.len() as f64 - 1.0) / 2.0
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_network::geometry::Point;
	use crate::components::flow_network::state::FlowState;
	use crate::components::flow_network::types::FlowConfig;

	fn state(links: &str) -> FlowState {
		let mut s = FlowState::new(
			FlowConfig::from_json(&format!(
				r#"{{
					"nodes": [ {{ "id": "a" }}, {{ "id": "b" }}, {{ "id": "c" }}, {{ "id": "d" }} ],
					"links": {links}
				}}"#
			))
			.unwrap(),
		);
		let spots = [(0.0, 100.0), (200.0, 0.0), (200.0, 100.0), (200.0, 200.0)];
		for (node, (x, y)) in s.nodes.iter_mut().zip(spots) {
			node.center = Point::new(x, y);
			node.size = 60.0;
		}
		s
	}

	#[test]
	fn test_three_siblings_symmetric() {
		let s = state(
			r#"[ { "from": "a", "to": "d" }, { "from": "a", "to": "b" },
				{ "from": "a", "to": "c" } ]"#,
		);
		let offsets = fan_offsets(&s.links, &s.nodes);
		// ordered by target y: b (0), c (100), d (200)
		assert_eq!(offsets, vec![1.0, -1.0, 0.0]);
		assert_eq!(offsets.iter().sum::<f64>(), 0.0);
	}

	#[test]
	fn test_lone_link_centered() {
		let s = state(r#"[ { "from": "a", "to": "b" } ]"#);
		assert_eq!(fan_offsets(&s.links, &s.nodes), vec![0.0]);
	}

	#[test]
	fn test_even_group_half_steps() {
		let s = state(r#"[ { "from": "a", "to": "b" }, { "from": "a", "to": "c" } ]"#);
		assert_eq!(fan_offsets(&s.links, &s.nodes), vec![-0.5, 0.5]);
	}

	#[test]
	fn test_shared_target_and_duplicates() {
		let s = state(
			r#"[ { "from": "b", "to": "c" }, { "from": "d", "to": "c" },
				{ "from": "d", "to": "c" } ]"#,
		);
		let offsets = fan_offsets(&s.links, &s.nodes);
		assert_eq!(offsets[0], -1.0);
		// duplicates share a far endpoint and split by declaration order
		assert_eq!(&offsets[1..], &[0.0, 1.0]);
	}

	#[test]
	fn test_explicit_curve_skipped() {
		let s = state(
			r#"[ { "from": "a", "to": "b", "curve": 0.3 }, { "from": "a", "to": "c" } ]"#,
		);
		let offsets = fan_offsets(&s.links, &s.nodes);
		assert_eq!(offsets[0], 0.0);
		// explicit-curve links still occupy a slot in their siblings' groups
		assert_eq!(offsets[1], 0.5);
	}

	#[test]
	fn test_curvature_applied_through_geometry() {
		let mut s = state(
			r#"[ { "from": "a", "to": "b" }, { "from": "a", "to": "c" },
				{ "from": "a", "to": "d" } ]"#,
		);
		s.update_geometry();
		let curved: Vec<bool> = s.links.iter().map(|l| l.path.unwrap().curved).collect();
		assert_eq!(curved, vec![true, false, true]);
	}
}
