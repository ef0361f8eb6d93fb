//! Session state and the protocol state machine driving it.

pub mod composer;
pub mod dispatcher;
pub mod errors;
pub mod interpreter;
pub mod state;

pub use composer::{ResponseComposer, select_tile};
pub use dispatcher::{Backends, MessageDispatcher};
pub use errors::SessionError;
pub use interpreter::{ReplyInterpreter, SilentInterpreter};
pub use state::{ConnectParams, ContextHandle, Session};
