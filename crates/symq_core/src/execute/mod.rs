pub mod builders;
pub mod compile;
pub mod handle;

pub use handle::{DeferredQuery, ExecutableQuery};
