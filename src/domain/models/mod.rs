mod action;
mod backend;
mod capability;
mod capture;
mod error;
mod event;
mod language;
mod message;
mod session;
mod slash_commands;
mod speech;
mod status;
mod timestamp;
mod voice;

pub use action::*;
pub use backend::*;
pub use capability::*;
pub use capture::*;
pub use error::*;
pub use event::*;
pub use language::*;
pub use message::*;
pub use session::*;
pub use slash_commands::*;
pub use speech::*;
pub use status::*;
pub use voice::*;
