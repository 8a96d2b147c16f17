pub mod config;
pub mod cookie_store;
pub mod error;
pub mod php_serialize;
pub mod types;

pub use config::AppConfig;
pub use cookie_store::CookieJar;
pub use error::InstallError;
pub use php_serialize::{PhpKey, PhpValue};
pub use types::*;
