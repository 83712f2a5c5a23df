pub mod clock;
pub mod engine;
pub mod state;

pub use clock::{elapsed_seconds, format_hms, Clock, ManualClock, SystemClock};
pub use engine::CountdownEngine;
pub use state::{CountdownEvent, CountdownEventKind, CountdownSnapshot, PhaseMode};
