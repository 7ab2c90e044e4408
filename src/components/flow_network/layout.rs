//! Grid placement of nodes: responsive columns, pinned cells, per-row centring.

use log::debug;

use super::geometry::Point;
use super::state::Node;
use super::types::LayoutConfig;

const MIN_CELL_WIDTH: f64 = 60.0;
const MIN_PREFERRED_WIDTH: f64 = 80.0;
const NODE_CELL_RATIO: f64 = 0.70;
const MAX_COLUMNS: u32 = 32;

/// Resolved grid geometry for one surface width.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutMetrics {
	/// Columns after responsive collapse.
	pub columns: usize,
	/// Rows, including any reached only by pinned nodes.
	pub rows: usize,
	/// Horizontal gap.
	pub gap_x: f64,
	/// Vertical gap.
	pub gap_y: f64,
	/// Horizontal padding.
	pub padding_x: f64,
	/// Vertical padding.
	pub padding_y: f64,
	/// Cell width.
	pub cell_width: f64,
	/// Cell height.
	pub cell_height: f64,
	/// Left edge of a full-width grid row.
	pub left_offset: f64,
	/// Top edge of the first row.
	pub top_offset: f64,
	/// Content height including padding.
	pub total_height: f64,
}

impl LayoutMetrics {
	/// Centre of a (possibly fractional) 1-based row and 1-based column.
	fn cell_center(&self, row: f64, col: usize, left: f64) -> Point {
		let x = left + (col as f64 - 1.0) * (self.cell_width + self.gap_x);
		let y = self.top_offset + (row - 1.0) * (self.cell_height + self.gap_y);
		Point::new(x + self.cell_width / 2.0, y + self.cell_height / 2.0)
	}

	fn row_width(&self, cells: usize) -> f64 {
		let n = cells as f64;
		n * self.cell_width + (n - 1.0).max(0.0) * self.gap_x
	}
}

/// Compute grid metrics for `nodes` on a surface `width` CSS pixels wide.
pub fn metrics(nodes: &[Node], cfg: &LayoutConfig, width: f64) -> LayoutMetrics {
	let padding_x = cfg.padding_x.max(0.0);
	let padding_y = cfg.padding_y.max(0.0);
	let gap_x = cfg.gap_x.max(0.0);
	let gap_y = cfg.gap_y.max(0.0);
	let preferred = cfg.preferred_col_width.max(MIN_PREFERRED_WIDTH);
	let available = (width - padding_x * 2.0).max(1.0);

	let mut columns = cfg.columns.clamp(1, MAX_COLUMNS) as usize;
	if cfg.responsive {
		let span = |n: usize| n as f64 * preferred + (n as f64 - 1.0) * gap_x;
		while columns > 1 && span(columns) > available {
			columns -= 1;
		}
	}

	let auto_rows = nodes.len().div_ceil(columns);
	let any_pinned = nodes.iter().any(|n| n.placement.is_pinned());
	let rows = if any_pinned {
		// Pinned rows may leave gaps, at most one empty row per node.
		let limit = auto_rows + nodes.len();
		let highest = nodes
			.iter()
			.filter_map(|n| n.placement.row)
			.map(|r| r.ceil().clamp(0.0, limit as f64) as usize)
			.max()
			.unwrap_or(0);
		highest.max(auto_rows)
	} else {
		auto_rows
	};

	let fit = (available - (columns as f64 - 1.0) * gap_x) / columns as f64;
	let cell_width = fit.min(preferred).max(MIN_CELL_WIDTH);
	let cell_height = cfg
		.cell_height
		.filter(|h| h.is_finite() && *h > 0.0)
		.unwrap_or(cell_width);

	let grid_width = columns as f64 * cell_width + (columns as f64 - 1.0) * gap_x;
	let total_height = if rows == 0 {
		padding_y * 2.0
	} else {
		padding_y * 2.0 + rows as f64 * cell_height + (rows as f64 - 1.0) * gap_y
	};

	LayoutMetrics {
		columns,
		rows,
		gap_x,
		gap_y,
		padding_x,
		padding_y,
		cell_width,
		cell_height,
		left_offset: (width - grid_width) / 2.0,
		top_offset: padding_y,
		total_height,
	}
}

/// Place every node and resolve its size. Positions depend only on the inputs, so
/// repeated calls with the same nodes, config and width are idempotent.
pub fn layout(nodes: &mut [Node], cfg: &LayoutConfig, width: f64) -> LayoutMetrics {
	let m = metrics(nodes, cfg, width);

	let mut order: Vec<usize> = (0..nodes.len()).collect();
	order.sort_by_key(|&i| nodes[i].order);

	if nodes.iter().any(|n| n.placement.is_pinned()) {
		place_mixed(nodes, &order, &m);
	} else {
		place_rows(nodes, &order, &m, width);
	}

	for node in nodes.iter_mut() {
		auto_scale(node, m.cell_width, cfg);
	}
	m
}

/// Row-major placement; each row is centred on its own.
fn place_rows(nodes: &mut [Node], order: &[usize], m: &LayoutMetrics, width: f64) {
	for (row, chunk) in order.chunks(m.columns).enumerate() {
		let left = (width - m.row_width(chunk.len())) / 2.0;
		for (col, &i) in chunk.iter().enumerate() {
			nodes[i].center = m.cell_center(row as f64 + 1.0, col + 1, left);
		}
	}
}

fn place_mixed(nodes: &mut [Node], order: &[usize], m: &LayoutMetrics) {
	let (rows, cols) = (m.rows, m.columns);
	let mut grid: Vec<Option<usize>> = vec![None; rows * cols];
	let mut fractional = Vec::new();
	let mut free = Vec::new();

	for &i in order {
		let placement = nodes[i].placement;
		if !placement.is_pinned() {
			free.push(i);
			continue;
		}
		let row = placement.row.unwrap_or(1.0);
		let col = placement.col.map_or(1, |c| (c as usize).clamp(1, cols));
		if row.fract() == 0.0 {
			let r = (row as i64).clamp(1, rows as i64) as usize;
			let cell = &mut grid[(r - 1) * cols + (col - 1)];
			if cell.is_none() {
				*cell = Some(i);
			} else {
				debug!("node `{}` collides at {r}:{col}, placing freely", nodes[i].id);
				free.push(i);
			}
		} else {
			fractional.push((i, row.clamp(1.0, rows as f64), col));
		}
	}

	let mut free = free.into_iter();
	for cell in grid.iter_mut().filter(|c| c.is_none()) {
		match free.next() {
			Some(i) => *cell = Some(i),
			None => break,
		}
	}

	for (k, cell) in grid.iter().enumerate() {
		if let Some(i) = *cell {
			nodes[i].center = m.cell_center((k / cols) as f64 + 1.0, k % cols + 1, m.left_offset);
		}
	}
	for (i, row, col) in fractional {
		nodes[i].center = m.cell_center(row, col, m.left_offset);
	}
}

fn auto_scale(node: &mut Node, cell_width: f64, cfg: &LayoutConfig) {
	let size = match node.explicit.size {
		Some(size) => size,
		None => (cell_width * NODE_CELL_RATIO)
			.clamp(cfg.node_min_size, cfg.node_max_size.max(cfg.node_min_size))
			.round(),
	};
	node.size = size;
	node.icon_size = node
		.explicit
		.icon
		.unwrap_or_else(|| (size * 0.38).round().clamp(16.0, 64.0));
	node.font_size = node
		.explicit
		.font
		.unwrap_or_else(|| (size * 0.18).clamp(12.0, 18.0).round());
}
