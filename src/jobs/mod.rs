//! Background work: the poll cycle and the scheduler that repeats it.

pub mod poll;
pub mod scheduler;

pub use poll::{CycleSummary, Poller};
pub use scheduler::{Scheduler, SchedulerState};
