mod config;
mod events;
mod federation;

pub use config::{FederationConfig, SelfLbtsPolicy};
pub use events::Events;
pub use federation::Federation;
