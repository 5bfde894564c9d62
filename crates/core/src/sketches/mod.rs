//! The three interactive 2D thought experiments.
//!
//! Each sketch is a [`FrameHandler`](crate::FrameHandler) that owns its entity
//! collections outright and emits a [`DrawList`](crate::DrawList) per frame.

mod friendship;
mod mirror;
mod wave;

pub use friendship::FriendshipSketch;
pub use mirror::MirrorSketch;
pub use wave::WaveSketch;

use serde::{Deserialize, Serialize};

use crate::{entities::Decision, Complexity};

/// Derived state a surface exposes to its host for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "surface", rename_all = "lowercase")]
pub enum SurfaceStatus {
    Mirror {
        /// Smoothed coherence level in `[0, 1]`.
        coherence: f32,
        mirrors: usize,
    },
    Friendship {
        coupling: f64,
        decisions: (Decision, Decision),
        /// `None` while the agents are undecided.
        matched: Option<bool>,
    },
    Wave {
        observing: bool,
        in_flight: usize,
        collapses: u64,
    },
    Field {
        complexity: Complexity,
        points: usize,
        connections: usize,
        hovered: Option<String>,
    },
}

/// Anything that can report a [`SurfaceStatus`].
pub trait StatusSource {
    fn status(&self) -> SurfaceStatus;
}
