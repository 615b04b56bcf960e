pub mod codec;
mod error;
mod model;
mod store;

pub use error::*;
pub use model::Context;
pub use store::ContextStore;
