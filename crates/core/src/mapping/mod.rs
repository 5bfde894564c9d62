use serde::{Deserialize, Serialize};

use crate::{Complexity, SurfaceConfig};

const REDUCED_MOTION_SCALE: f32 = 0.25;

/// Concrete render parameters derived from the host's [`SurfaceConfig`].
///
/// Scene composers never look at the raw configuration; they are handed one of
/// these whenever the configuration snapshot changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    /// Complexity after the reduced-motion override has been applied.
    pub complexity: Complexity,
    pub field_particle_count: usize,
    pub show_connections: bool,
    pub post_processing: bool,
    /// Pointer manipulation and camera control are honoured only when set.
    pub interactive: bool,
    /// Multiplier for purely decorative motion (pulses, floating). Kernels
    /// ignore it.
    pub motion_scale: f32,
}

impl RenderParams {
    pub fn from_config(config: &SurfaceConfig) -> Self {
        let complexity = if config.reduced_motion {
            Complexity::Low
        } else {
            config.complexity
        };

        Self {
            complexity,
            field_particle_count: field_particle_count(complexity),
            show_connections: complexity != Complexity::Low,
            post_processing: complexity == Complexity::High,
            interactive: config.interaction_enabled,
            motion_scale: if config.reduced_motion {
                REDUCED_MOTION_SCALE
            } else {
                1.0
            },
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::from_config(&SurfaceConfig::default())
    }
}

/// Number of background field particles rendered at a given complexity.
pub fn field_particle_count(complexity: Complexity) -> usize {
    match complexity {
        Complexity::Low => 500,
        Complexity::Medium => 1000,
        Complexity::High => 2000,
    }
}
