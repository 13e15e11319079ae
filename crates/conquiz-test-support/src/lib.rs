//! Shared test doubles for the Conquiz game engine.

mod clock;
mod producer;
mod rng;

pub use clock::{FixedClock, StepClock, fixed_time};
pub use producer::{FailingProducer, RecordingProducer};
pub use rng::{MockRng, SequenceRng};
