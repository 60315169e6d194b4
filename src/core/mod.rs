pub mod config;
pub mod jwt_auth;
mod responses;
pub mod store;
mod telemetry;
pub mod utils;

pub use self::config::AppConfig;
pub use jwt_auth::AuthenticatedUser;
pub use responses::*;
pub use store::{KeyValueStore, MemoryStore, RedisStore, StoreError};
pub use telemetry::*;
pub use utils::*;
