//! Time and task primitives for the single-threaded browser runtime.

mod task;
mod time;

pub use task::{run_recurring, CancellationToken, RecurringTask};
pub use time::{wallclock_ms, SessionClock};
