pub mod error;
pub mod events;
pub mod player;
pub mod replication;
pub mod room;
pub mod scoring;

// Re-export main components
pub use error::*;
pub use events::*;
pub use player::*;
pub use replication::*;
pub use room::*;
pub use scoring::*;
