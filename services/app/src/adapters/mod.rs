pub mod clock;
pub mod file_store;

pub use clock::SystemClock;
pub use file_store::FileStore;
