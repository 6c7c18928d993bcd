// Library surface: the metrics engine plus the collaborators the terminal
// binary wires around it. Headless and integration tests go through here.
pub mod app_dirs;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod flow;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod rating;
pub mod runtime;
pub mod session;
pub mod time_series;

pub use error::{Error, Result};
pub use metrics::{compute_accuracy, compute_wpm, is_complete};
pub use session::{SessionConfig, SessionMetrics, SessionPhase, TypingSession};
