pub mod storage;
pub mod types;

pub use storage::{get_cache_path, load_cache, save_cache};
pub use types::{CachedEstimate, EstimateCache};
