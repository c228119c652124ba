mod dialect;

pub use dialect::*;
