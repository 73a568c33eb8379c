pub mod storage;
pub mod types;

pub use storage::{load_store, save_store};
pub use types::{SiteHistory, Store, STORE_VERSION};
