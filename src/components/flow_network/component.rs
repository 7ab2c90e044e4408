use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, ResizeObserver, ResizeObserverEntry};

use super::readings::Readings;
use super::render::CanvasSurface;
use super::scheduler::RenderScheduler;
use super::types::FlowConfig;

const LAYER_STYLE: &str =
	"display: block; position: absolute; inset: 0; width: 100%; height: 100%;";

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type ResizeCallback = Rc<RefCell<Option<Closure<dyn FnMut(js_sys::Array)>>>>;

fn is_visible() -> bool {
	web_sys::window()
		.and_then(|w| w.document())
		.map(|d| !d.hidden())
		.unwrap_or(true)
}

fn request_frame(callback: &FrameCallback, pending: &Cell<Option<i32>>) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Some(ref cb) = *callback.borrow() {
		match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(id) => pending.set(Some(id)),
			Err(err) => warn!("requestAnimationFrame failed: {err:?}"),
		}
	}
}

/// Browser handles of one mounted widget. The frame closure holds a clone, so the
/// loop stays alive until [`FrameLoop::detach`] breaks the cycle.
#[derive(Clone)]
struct FrameLoop {
	scheduler: Rc<RefCell<RenderScheduler>>,
	animate: FrameCallback,
	on_resize: ResizeCallback,
	observer: Rc<RefCell<Option<ResizeObserver>>>,
	pending: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	fn new(scheduler: RenderScheduler) -> Self {
		Self {
			scheduler: Rc::new(RefCell::new(scheduler)),
			animate: Rc::new(RefCell::new(None)),
			on_resize: Rc::new(RefCell::new(None)),
			observer: Rc::new(RefCell::new(None)),
			pending: Rc::new(Cell::new(None)),
		}
	}

	fn request_frame(&self) {
		request_frame(&self.animate, &self.pending);
	}

	/// Cancel the queued frame, disconnect the observer and drop both closures.
	fn detach(&self) {
		self.scheduler.borrow_mut().stop();
		if let (Some(id), Some(window)) = (self.pending.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(ro) = self.observer.borrow_mut().take() {
			ro.disconnect();
		}
		self.animate.borrow_mut().take();
		self.on_resize.borrow_mut().take();
	}
}

/// Animated energy-flow network drawn on two stacked canvases.
#[component]
pub fn FlowNetworkCanvas(
	/// Nodes, links and styling; a change relays out and restarts every phase.
	#[prop(into)]
	config: Signal<FlowConfig>,
	/// Current entity values; a change repaints the value text.
	#[prop(into)]
	readings: Signal<Readings>,
	/// Initial wrapper height in CSS pixels; auto height replaces it after layout.
	#[prop(default = 360.0)]
	height: f64,
) -> impl IntoView {
	let wrapper_ref = NodeRef::<leptos::html::Div>::new();
	let bg_ref = NodeRef::<leptos::html::Canvas>::new();
	let fg_ref = NodeRef::<leptos::html::Canvas>::new();

	let frames = FrameLoop::new(RenderScheduler::new(config.get_untracked()));
	let snapshot = Rc::new(RefCell::new(readings.get_untracked()));
	let surface: Rc<RefCell<Option<CanvasSurface>>> = Rc::new(RefCell::new(None));

	let teardown = SendWrapper::new(frames.clone());
	on_cleanup(move || {
		teardown.take().detach();
		debug!("flow network detached");
	});

	let scheduler_cfg = frames.scheduler.clone();
	Effect::new(move |prev: Option<()>| {
		let cfg = config.get();
		if prev.is_some() {
			debug!("flow config changed: {} nodes, {} links", cfg.nodes.len(), cfg.links.len());
			scheduler_cfg.borrow_mut().set_config(cfg);
		}
	});

	let (scheduler_data, snapshot_data) = (frames.scheduler.clone(), snapshot.clone());
	Effect::new(move |_| {
		*snapshot_data.borrow_mut() = readings.get();
		scheduler_data.borrow_mut().data_changed();
	});

	Effect::new(move |_| {
		let (Some(wrapper), Some(bg), Some(fg)) = (wrapper_ref.get(), bg_ref.get(), fg_ref.get())
		else {
			return;
		};
		if surface.borrow().is_some() {
			return;
		}
		let wrapper: HtmlElement = wrapper.into();

		match CanvasSurface::new(bg, fg) {
			Ok(s) => *surface.borrow_mut() = Some(s),
			Err(err) => {
				warn!("flow network canvas unavailable: {err}");
				return;
			}
		}

		let (scheduler_rs, surface_rs) = (frames.scheduler.clone(), surface.clone());
		*frames.on_resize.borrow_mut() = Some(Closure::new(move |entries: js_sys::Array| {
			let Ok(entry) = entries.get(0).dyn_into::<ResizeObserverEntry>() else {
				return;
			};
			let rect = entry.content_rect();
			let (w, h) = (rect.width(), rect.height());
			let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
			if let Some(ref mut s) = *surface_rs.borrow_mut() {
				if let Err(err) = s.resize(w, h, dpr) {
					warn!("canvas resize failed: {err}");
				}
			}
			scheduler_rs.borrow_mut().resize(w, h);
		}));
		if let Some(ref cb) = *frames.on_resize.borrow() {
			match ResizeObserver::new(cb.as_ref().unchecked_ref()) {
				Ok(ro) => {
					ro.observe(&wrapper);
					*frames.observer.borrow_mut() = Some(ro);
				}
				Err(err) => warn!("ResizeObserver unavailable: {err:?}"),
			}
		}

		let (frames_anim, surface_anim, snapshot_anim) =
			(frames.clone(), surface.clone(), snapshot.clone());
		let applied_height = Cell::new(height);
		*frames.animate.borrow_mut() = Some(Closure::new(move |ts: f64| {
			// Queue the next frame first so a failing frame cannot end the loop.
			frames_anim.request_frame();

			let mut sched = frames_anim.scheduler.borrow_mut();
			if let Some(ref mut s) = *surface_anim.borrow_mut() {
				sched.tick(ts, is_visible(), &snapshot_anim.borrow(), s);
			}

			if let Some(content) = sched.content_height().map(f64::round) {
				if (content - applied_height.get()).abs() >= 0.5 {
					applied_height.set(content);
					let css = format!("{content}px");
					if let Err(err) = wrapper.style().set_property("height", &css) {
						warn!("auto height failed: {err:?}");
					}
				}
			}
		}));

		frames.scheduler.borrow_mut().start();
		frames.request_frame();
	});

	view! {
		<div
			node_ref=wrapper_ref
			class="flow-network"
			style=format!("position: relative; width: 100%; height: {height}px;")
		>
			<canvas node_ref=bg_ref style=LAYER_STYLE />
			<canvas node_ref=fg_ref style=LAYER_STYLE />
		</div>
	}
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
	use wasm_bindgen_test::*;

	use super::*;
	use crate::components::flow_network::scheduler::RunState;

	wasm_bindgen_test_configure!(run_in_browser);

	#[wasm_bindgen_test]
	fn test_detach_releases_frame_loop() {
		let frames = FrameLoop::new(RenderScheduler::new(FlowConfig::default()));
		let inner = frames.clone();
		*frames.animate.borrow_mut() = Some(Closure::new(move |_ts: f64| inner.request_frame()));
		frames.scheduler.borrow_mut().start();
		frames.request_frame();
		assert!(frames.pending.get().is_some());

		let scheduler = Rc::downgrade(&frames.scheduler);
		frames.detach();
		assert_eq!(frames.pending.get(), None);
		assert!(frames.animate.borrow().is_none());
		assert_eq!(frames.scheduler.borrow().run_state(), RunState::Stopped);

		// the closure's clone is gone, so ours is the last owner
		drop(frames);
		assert!(scheduler.upgrade().is_none());
	}

	#[wasm_bindgen_test]
	fn test_detach_without_mount() {
		let frames = FrameLoop::new(RenderScheduler::new(FlowConfig::default()));
		frames.detach();
		assert!(frames.observer.borrow().is_none());
	}
}
