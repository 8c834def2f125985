pub mod controller;
pub mod event;
pub mod state;

pub use controller::*;
pub use event::*;
pub use state::*;
