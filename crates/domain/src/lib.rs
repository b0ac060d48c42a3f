pub mod errors;
pub mod stats;
pub mod task;
pub mod timestamp;
pub mod user;

pub use errors::*;
pub use stats::*;
pub use task::*;
pub use timestamp::*;
pub use user::*;
