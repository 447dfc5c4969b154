pub mod card;
pub mod errors;
pub mod game;
pub mod messages;

// Re-export all types
pub use card::*;
pub use errors::*;
pub use game::*;
pub use messages::*;
