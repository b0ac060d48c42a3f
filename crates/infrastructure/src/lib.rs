pub mod auth_api;
pub mod http;
pub mod session;
pub mod storage;
pub mod task_client;

pub use auth_api::*;
pub use http::*;
pub use session::*;
pub use storage::*;
pub use task_client::*;
