pub mod cache;
pub mod database;
pub mod impls;
pub mod model;
pub mod store;

pub use cache::CacheService;
pub use database::{Database, MIGRATOR};
pub use model::leveling::{MAX_COINS, UserProgress};
pub use store::{BackendOptions, JsonProgressStore, ProgressStore};
