//! Animation drivers: one clip playing on one model.

use std::sync::Arc;

use instant::Duration;

use crate::{
    data_structures::scene_graph::{ModelId, Scene},
    resources::animation::AnimationClip,
};

/// Plays one clip on one model.
///
/// The driver keeps the total time it has been advanced by; the position
/// inside the clip is derived from it, so looping never loses precision in
/// the clock itself.
#[derive(Clone, Debug)]
pub struct AnimationDriver {
    model: ModelId,
    clip: Arc<AnimationClip>,
    elapsed: Duration,
    playing: bool,
}

impl AnimationDriver {
    /// Creates a stopped driver.
    pub fn new(model: ModelId, clip: Arc<AnimationClip>) -> Self {
        Self {
            model,
            clip,
            elapsed: Duration::ZERO,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Total time this driver has been advanced by while playing.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn advance(&mut self, dt: Duration) {
        if self.playing {
            self.elapsed += dt;
        }
    }

    /// Position inside the clip in seconds, wrapping around at its end.
    pub fn local_time(&self) -> f32 {
        let duration = self.clip.duration();
        if duration > 0.0 {
            (self.elapsed.as_secs_f64() % duration as f64) as f32
        } else {
            0.0
        }
    }

    /// Poses the bound model. Does nothing if the model is not in `scene`.
    pub fn apply(&self, scene: &mut Scene) {
        if let Some(model) = scene.model_mut(self.model) {
            model.apply_clip(&self.clip, self.local_time());
        }
    }
}
