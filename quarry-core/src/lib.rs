mod as_value;
mod cache;
mod compiler;
mod condition;
mod config;
mod data_type;
mod error;
mod executor;
mod materializer;
mod metadata;
mod session;
mod util;
mod value;
mod writer;

pub use as_value::*;
pub use cache::*;
pub use compiler::*;
pub use condition::*;
pub use config::*;
pub use data_type::*;
pub use error::*;
pub use executor::*;
pub use materializer::*;
pub use metadata::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
#[doc(hidden)]
pub use ::itoa;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
