pub mod health;
pub mod search;

pub use health::{health_handler, root_handler};
pub use search::{search_handler, MAX_BODY_BYTES};
