//! Campaign dispatch: bounded-concurrency fan-out of one send to many customers.

mod coordinator;

pub use coordinator::{DispatchCoordinator, DispatchStats, DispatchStatsSnapshot};
