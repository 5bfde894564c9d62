//! Core library for the Unity Field teaching surfaces.
//!
//! Each surface is a [`FrameHandler`] driven by a [`FrameLoop`]: three 2D
//! thought experiments (mirrors, friendship, double slit) that emit
//! [`DrawList`]s, and a 3D field visualization that emits [`SceneFrame`]s.
//! Frames are handed to any [`Renderer`], such as the in-process
//! [`RenderGraph`] or the JSON-lines [`Recorder`].

pub mod config;
pub mod entities;
pub mod error;
pub mod kernels;
pub mod mapping;
pub mod record;
pub mod render;
pub mod scene;
pub mod sketches;
pub mod timeline;

pub use config::{AppConfig, Complexity, DisplayConfig, FriendshipConfig, SurfaceConfig};
pub use error::{FieldError, Result};
pub use mapping::RenderParams;
pub use record::{Recorder, RecordingSettings};
pub use render::{Command2d, DrawList, RenderGraph, Renderer, SceneFrame};
pub use scene::{FieldScene, OrbitCamera};
pub use sketches::{FriendshipSketch, MirrorSketch, StatusSource, SurfaceStatus, WaveSketch};
pub use timeline::{
    Bounds, DisplayLink, FrameClock, FrameContext, FrameHandler, FrameLoop, InputEvent,
    LoopHandle, Surface, Viewport,
};
