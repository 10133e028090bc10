//! HTTP front end: framing, parsing seam, reply builder, threaded server.

pub mod connection;
pub mod frame;
pub mod message;
pub mod parser;
pub mod reply;
pub mod server;

pub use connection::{handle_connection, Dispatcher};
pub use frame::{FrameAccumulator, FrameState};
pub use message::HttpMessage;
pub use parser::{HttpParser, MessageParser, ParseOutcome};
pub use reply::{build_reply, decimal_digits, http_reply, reply_size};
pub use server::{Server, WorkerHandle};
