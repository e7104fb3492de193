pub mod execute;
pub mod expr;
pub mod operators;
pub mod rewrite;
pub mod runtime;
pub mod types;
