pub mod connector;
pub mod decoder;

pub use connector::*;
pub use decoder::*;
