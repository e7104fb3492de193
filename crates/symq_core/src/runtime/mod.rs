pub mod cancel;
pub mod sequence;
pub mod value;
