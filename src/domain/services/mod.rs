mod assistant;
mod dispatcher;
mod interaction;
mod sessions;
mod speech_output;
mod translations;
mod voice_input;

#[cfg(test)]
pub mod testing;

pub use assistant::*;
pub use dispatcher::*;
pub use interaction::*;
pub use sessions::*;
pub use speech_output::*;
pub use translations::*;
pub use voice_input::*;
