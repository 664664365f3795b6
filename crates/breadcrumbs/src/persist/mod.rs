pub mod reader;
pub mod store;

pub use reader::load_previous_events;
pub use store::PersistentStore;
