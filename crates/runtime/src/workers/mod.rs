//! Worker tasks that back the engine.

mod ticker;

pub use ticker::{TickWorker, TickerHandle};
