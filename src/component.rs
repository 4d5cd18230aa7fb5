//! Host lifecycle for bus components.
//!
//! A host (the CLI's tokio loop, or an embedding application) calls `setup`
//! once, then `tick` periodically from a single context. Ticks never overlap.

use crate::error::TinBusError;

pub trait BusComponent {
    /// One-time initialisation before the first tick.
    fn setup(&mut self);

    /// Processes all pending input and due periodic work.
    fn tick(&mut self) -> Result<(), TinBusError>;

    /// Logs the active configuration.
    fn dump_config(&self);
}
