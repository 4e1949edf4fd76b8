mod activity;
mod connection;
mod couple;
mod discovery;
mod memory;
mod quest;

pub use activity::*;
pub use connection::*;
pub use couple::*;
pub use discovery::*;
pub use memory::*;
pub use quest::*;
