pub mod cleanup;
pub mod deck;
pub mod game_events;
pub mod game_state;
pub mod rules;

// Re-export main components
pub use cleanup::*;
pub use deck::*;
pub use game_events::*;
pub use game_state::*;
pub use rules::*;
