//! Point math shared by layout, fan-out and both render passes.

use super::types::Shape;

/// Largest corner radius of a rounded node.
pub const CORNER_RADIUS: f64 = 14.0;

/// A position in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal, growing right.
	pub x: f64,
	/// Vertical, growing down.
	pub y: f64,
}

impl Point {
	/// Build a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}

	/// Linear interpolation toward `other`.
	pub fn lerp(self, other: Point, t: f64) -> Point {
		Point::new(
			self.x + (other.x - self.x) * t,
			self.y + (other.y - self.y) * t,
		)
	}
}

impl Shape {
	/// Corner radius used both for drawing and for border intersection.
	pub fn corner_radius(self, half: f64) -> f64 {
		match self {
			Shape::Rounded => CORNER_RADIUS.min(half),
			Shape::Circle | Shape::Square => 0.0,
		}
	}

	/// Distance from the centre to the border along the unit vector `(ux, uy)`.
	pub fn border_distance(self, half: f64, ux: f64, uy: f64) -> f64 {
		match self {
			Shape::Circle => half,
			Shape::Square => box_exit(half, half, ux, uy),
			// Exact on the flat faces, approximate near the corners.
			Shape::Rounded => {
				let radius = self.corner_radius(half);
				let core = (half - radius).max(0.0);
				box_exit(core, core, ux, uy) + radius
			}
		}
	}
}

fn box_exit(hw: f64, hh: f64, ux: f64, uy: f64) -> f64 {
	let tx = if ux == 0.0 { f64::INFINITY } else { hw / ux.abs() };
	let ty = if uy == 0.0 { f64::INFINITY } else { hh / uy.abs() };
	tx.min(ty)
}

/// Point on the border of a node of `shape`/`size` centred at `from`, facing `toward`.
pub fn edge_point(from: Point, shape: Shape, size: f64, toward: Point) -> Point {
	let (dx, dy) = (toward.x - from.x, toward.y - from.y);
	let len = dx.hypot(dy);
	let (ux, uy) = if len > 0.0 && len.is_finite() {
		(dx / len, dy / len)
	} else {
		(1.0, 0.0)
	};
	let t = shape.border_distance(size / 2.0, ux, uy);
	Point::new(from.x + ux * t, from.y + uy * t)
}

/// Quadratic Bezier through `a` and `b` with control point `c`.
pub fn curve_point(a: Point, c: Point, b: Point, t: f64) -> Point {
	if t == 0.0 {
		return a;
	}
	if t == 1.0 {
		return b;
	}
	let u = 1.0 - t;
	Point::new(
		u * u * a.x + 2.0 * u * t * c.x + t * t * b.x,
		u * u * a.y + 2.0 * u * t * c.y + t * t * b.y,
	)
}

/// Control point offset from the chord midpoint by `fraction` of the chord length.
pub fn curve_control(a: Point, b: Point, fraction: f64) -> Point {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let mid = a.lerp(b, 0.5);
	let chord = dx.hypot(dy);
	if chord == 0.0 {
		return mid;
	}
	let (nx, ny) = (-dy / chord, dx / chord);
	Point::new(mid.x + nx * fraction * chord, mid.y + ny * fraction * chord)
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f64 = 1e-9;

	fn directions() -> Vec<Point> {
		(0..24)
			.map(|i| {
				let a = i as f64 * std::f64::consts::TAU / 24.0 + 0.1;
				Point::new(100.0 + 250.0 * a.cos(), 80.0 + 250.0 * a.sin())
			})
			.collect()
	}

	#[test]
	fn test_circle_edge_on_radius_and_ray() {
		let centre = Point::new(100.0, 80.0);
		for toward in directions() {
			let p = edge_point(centre, Shape::Circle, 60.0, toward);
			assert!((p.distance(centre) - 30.0).abs() < EPS);
			// collinear and on the same side as `toward`
			let cross = (p.x - centre.x) * (toward.y - centre.y)
				- (p.y - centre.y) * (toward.x - centre.x);
			assert!(cross.abs() < 1e-6);
			let dot = (p.x - centre.x) * (toward.x - centre.x)
				+ (p.y - centre.y) * (toward.y - centre.y);
			assert!(dot > 0.0);
		}
	}

	#[test]
	fn test_square_edge_on_box() {
		let centre = Point::new(100.0, 80.0);
		for toward in directions() {
			let p = edge_point(centre, Shape::Square, 60.0, toward);
			let m = (p.x - centre.x).abs().max((p.y - centre.y).abs());
			assert!((m - 30.0).abs() < EPS);
		}
	}

	#[test]
	fn test_rounded_edge_exact_on_faces() {
		let centre = Point::new(0.0, 0.0);
		let right = edge_point(centre, Shape::Rounded, 80.0, Point::new(500.0, 0.0));
		assert!((right.x - 40.0).abs() < EPS && right.y.abs() < EPS);
		let up = edge_point(centre, Shape::Rounded, 80.0, Point::new(0.0, -500.0));
		assert!((up.y + 40.0).abs() < EPS && up.x.abs() < EPS);
	}

	#[test]
	fn test_rounded_edge_within_corner_tolerance() {
		let centre = Point::new(0.0, 0.0);
		for toward in directions() {
			let p = edge_point(centre, Shape::Rounded, 80.0, toward);
			let m = p.x.abs().max(p.y.abs());
			// never beyond the bounding box by more than the corner radius
			assert!(m <= 40.0 + CORNER_RADIUS + EPS);
			assert!(p.distance(centre) >= 40.0 - EPS);
		}
	}

	#[test]
	fn test_coincident_centres_default_axis() {
		let c = Point::new(10.0, 10.0);
		let p = edge_point(c, Shape::Circle, 20.0, c);
		assert_eq!(p, Point::new(20.0, 10.0));
		let p = edge_point(c, Shape::Rounded, 20.0, c);
		assert!(p.x.is_finite() && p.y.is_finite());
	}

	#[test]
	fn test_curve_endpoints_exact() {
		let (a, c, b) = (
			Point::new(0.1, 0.7),
			Point::new(33.3, -9.1),
			Point::new(1e6 / 3.0, 2.0 / 3.0),
		);
		assert_eq!(curve_point(a, c, b, 0.0), a);
		assert_eq!(curve_point(a, c, b, 1.0), b);
	}

	#[test]
	fn test_curve_control_perpendicular() {
		let a = Point::new(0.0, 0.0);
		let b = Point::new(100.0, 0.0);
		assert_eq!(curve_control(a, b, 0.0), Point::new(50.0, 0.0));
		let c = curve_control(a, b, 0.1);
		assert!((c.x - 50.0).abs() < EPS);
		assert!((c.y - 10.0).abs() < EPS);
		let c = curve_control(a, b, -0.1);
		assert!((c.y + 10.0).abs() < EPS);
	}

	#[test]
	fn test_curve_midpoint_of_straight_chord() {
		let a = Point::new(0.0, 0.0);
		let b = Point::new(40.0, 20.0);
		let c = curve_control(a, b, 0.0);
		let p = curve_point(a, c, b, 0.5);
		assert!((p.x - 20.0).abs() < EPS && (p.y - 10.0).abs() < EPS);
	}
}
