use crate::error::EngineError;
use biosim_common::{Bounds, SampleRange};
use rand::distr::Uniform;

/// Per-frame contract shared by the three engines.
///
/// An external tick source calls [`FrameEngine::step`] once per frame on a
/// single thread and reads [`FrameEngine::snapshot`] to render.
pub trait FrameEngine {
    type Snapshot;

    fn name(&self) -> &'static str;

    /// Builds every population from scratch inside `bounds`.
    fn initialize(&mut self, bounds: Bounds) -> Result<(), EngineError>;

    /// Advances one tick. Literal per-tick increments ignore `dt`; it only
    /// drives the easing of displayed metric values.
    fn step(&mut self, dt: f32) -> Result<(), EngineError>;

    fn snapshot(&self) -> Result<Self::Snapshot, EngineError>;

    fn is_initialized(&self) -> bool;

    /// Number of `step` calls since the last `initialize`.
    fn tick(&self) -> u64;
}

/// Inclusive uniform distribution over a configured range.
pub(crate) fn uniform(range: SampleRange) -> Result<Uniform<f32>, EngineError> {
    Ok(Uniform::new_inclusive(range[0], range[1])?)
}

pub(crate) fn check_bounds(bounds: Bounds) -> Result<(), EngineError> {
    if bounds.is_valid() {
        Ok(())
    } else {
        Err(EngineError::InvalidBounds { width: bounds.width, height: bounds.height })
    }
}
