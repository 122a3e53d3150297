//! Event emission for module loads
//!
//! The loader publishes a `Loaded` event per successfully initialized
//! module, then one terminal `Done` or `Error` event per load.

mod bus;
mod memory;
mod types;

pub use bus::{EventBus, EventSeq};
pub use memory::MemoryEventBus;
pub use types::LoaderEvent;
