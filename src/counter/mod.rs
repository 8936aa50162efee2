pub mod exercise;
pub mod limb;
pub mod machine;
pub mod stage;

pub use exercise::{Bound, ExerciseKind, ExerciseProfile, JointAngle, LimbProfile};
pub use limb::{LimbTracker, Observation};
pub use machine::{ExerciseState, FrameOutcome, LimbReading, RepCounter};
pub use stage::Stage;
