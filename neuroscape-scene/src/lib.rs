//! neuroscape-scene - procedural generation and animation for the neuroscape backdrop.
//!
//! The crate is host independent: it builds the scene (neural network, DNA helix,
//! nested wireframe sphere, particle field), advances it frame by frame, and
//! models the page effects as state machines. Browser bindings live in
//! `neuroscape-web`; the native CLI lives in the `neuroscape` binary.

pub mod camera;
pub mod clock;
pub mod config;
pub mod dom;
pub mod draw;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod math;
pub mod pointer;
pub mod scene;
pub mod shading;
pub mod signal;

pub use camera::{CameraState, ParallaxCamera, Viewport};
pub use config::SceneConfig;
pub use dom::{DomCommand, DomEffectsController, PageEvent, PageLayout};
pub use draw::DrawList;
pub use error::{SceneError, SceneResult};
pub use frame::{Frame, FrameUpdater, HeadlessRenderer, Renderer};
pub use scene::{Scene, SceneAssembler};
