mod curve;
mod engine;
mod types;

pub use curve::YieldCurve;
pub use engine::calculate_ladder;
pub use types::{LadderError, LadderInput, LadderResult, LadderStep, YieldPoint};
