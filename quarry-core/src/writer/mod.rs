mod context;
mod dialect;
mod generic;
mod registry;

pub use context::*;
pub use dialect::*;
pub use generic::*;
pub use registry::*;
