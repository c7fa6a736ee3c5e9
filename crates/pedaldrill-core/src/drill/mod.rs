//! Drill runtime: clock, countdown, input sampling, judging and the
//! session state machine that ties them together.

mod countdown;
mod judge;
mod sampler;
mod session;
mod transport;

pub use countdown::{Countdown, CountdownConfig, CountdownValue};
pub use judge::{JudgeConfig, Judgment, JudgmentEngine, Resolution, TierWindow, ToleranceTable};
pub use sampler::{InputSample, InputSampler};
pub use session::{DrillSession, DrillSettings, SessionSnapshot, SessionState};
pub use transport::{Transport, TransportConfig};
