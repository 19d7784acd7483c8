pub mod interaction;
pub mod message;

pub use interaction::handle_interaction;
pub use message::handle_message;
