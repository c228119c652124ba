mod catalog;
pub(crate) mod naming;
mod record;
mod resolver;
mod table;

pub use catalog::*;
pub use naming::candidates;
pub use record::*;
pub use resolver::*;
pub use table::*;
