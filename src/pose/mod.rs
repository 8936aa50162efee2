pub mod angle;
pub mod gate;
pub mod landmark;
pub mod recording;

pub use angle::{checked_joint_angle, joint_angle};
pub use gate::{VisibilityGate, DEFAULT_VISIBILITY_THRESHOLD};
pub use landmark::{Landmark, LandmarkIndex, LandmarkSet};
pub use recording::{read_recording, Frame, RecordedFrame};
