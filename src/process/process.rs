use crate::error::Result;
use serde::Serialize;

/// Round-based process that can be driven by a
/// [`Simulator`](crate::process::simulator::Simulator).
pub trait Process {
    type FrameT: Serialize;

    fn step(&mut self, rng: &mut impl rand::Rng) -> Result<Self::FrameT>;

    fn configuration(&self) -> serde_json::Value;
}
