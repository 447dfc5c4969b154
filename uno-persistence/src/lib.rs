pub mod memory;
pub mod store;

pub use memory::InMemoryGameStore;
pub use store::{GameStore, StoreError};
