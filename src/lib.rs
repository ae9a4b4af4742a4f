//! Zoomable sunburst chart: radial partition layout, visibility and
//! squashing of thin arcs, animated zoom transitions and the host actions
//! offered from an arc's context menu.

pub mod animation;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod host;
pub mod radial_layout;
pub mod render_tree;
pub mod renderer;
pub mod scene;
pub mod tree;

pub use config::ChartConfig;
pub use error::{Result, SunburstError};
pub use radial_layout::{build_layout, ArcSpan, LayoutTree};
pub use renderer::{ClickTarget, RadialTreeRenderer};
pub use tree::{load_tree, TreeNode};
