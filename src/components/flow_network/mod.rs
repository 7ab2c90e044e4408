//! Animated energy-flow network: grid layout, border-exact links and a two-layer
//! canvas renderer driven once per animation frame.

mod component;
pub mod error;
pub mod fanout;
pub mod geometry;
pub mod layout;
pub mod readings;
mod render;
pub mod resolver;
pub mod scene;
pub mod scheduler;
pub mod state;
pub mod types;

pub use component::FlowNetworkCanvas;
pub use error::{ConfigError, RenderError};
pub use readings::{RawValue, Reading, Readings};
pub use resolver::Direction;
pub use scheduler::{FrameOutcome, RenderScheduler};
pub use types::{FlowConfig, LinkConfig, NodeConfig, Shape};
