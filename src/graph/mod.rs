//! Graph layout for the 3D account view.

pub mod layout;
pub mod scene;

pub use layout::{Layout, LayoutParams};
pub use scene::{build_scene, scene_document, GraphScene};
