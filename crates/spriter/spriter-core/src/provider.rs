//! Host-facing call surface.

use crate::data::AnimationView;
use crate::engine::Engine;
use crate::error::SpriterError;
use crate::frame::FrameData;

/// What a renderer calls once per tick.
pub trait FrameDataProvider {
    /// Evaluate `first` alone when `second` is `None`, otherwise blend toward
    /// `second` by `factor`. `transition_time` overrides the time `second` is
    /// sampled at.
    fn get_frame_data(
        &mut self,
        time: f32,
        delta_time: f32,
        factor: f32,
        first: AnimationView<'_>,
        second: Option<AnimationView<'_>>,
        transition_time: Option<f32>,
    ) -> Result<&FrameData, SpriterError>;
}

impl FrameDataProvider for Engine {
    fn get_frame_data(
        &mut self,
        time: f32,
        delta_time: f32,
        factor: f32,
        first: AnimationView<'_>,
        second: Option<AnimationView<'_>>,
        transition_time: Option<f32>,
    ) -> Result<&FrameData, SpriterError> {
        match second {
            None => self.evaluate(first, time, delta_time),
            Some(second) => {
                self.evaluate_blended(first, second, time, delta_time, transition_time, factor)
            }
        }
    }
}
