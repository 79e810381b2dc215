#![forbid(unsafe_code)]

mod logging;
mod rendering;

pub use logging::init_tracing;
pub use rendering::{render_instances_to_png, Canvas, RenderConfig};
