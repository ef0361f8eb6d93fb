//! Per-frame handling: decode, dispatch, and turn session errors into
//! client notices or a connection-ending failure.

use std::time::Instant;

use jemboo_clients::RemoteCallError;
use jemboo_core::{InboundMessage, OutboundMessage};
use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::metrics::{SESSION_ERRORS_TOTAL, SESSION_MESSAGE_DURATION_SECONDS, SESSION_MESSAGES_TOTAL};
use crate::session::{MessageDispatcher, Session, SessionError};

use super::connection::ClientConnection;

/// Handle one text frame.
///
/// Protocol rejections are reported to the client as an `error` message and
/// unsupported input is logged; both leave the connection open. A backend
/// failure is returned so the caller can close the connection.
pub async fn handle_frame(
    text: &str,
    session: &mut Session,
    connection: &ClientConnection,
    dispatcher: &MessageDispatcher,
) -> Result<(), RemoteCallError> {
    let message = match InboundMessage::parse(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(connection_id = %session.connection_id, error = %err, "rejected client message");
            counter!(SESSION_ERRORS_TOTAL, "kind" => "protocol").increment(1);
            let _ = connection.send_message(&OutboundMessage::from_protocol_error(&err));
            return Ok(());
        }
    };

    let message_type = message.message_type();
    counter!(SESSION_MESSAGES_TOTAL, "type" => message_type).increment(1);
    let start = Instant::now();
    let result = dispatcher.dispatch(session, connection, message).await;
    histogram!(SESSION_MESSAGE_DURATION_SECONDS, "type" => message_type)
        .record(start.elapsed().as_secs_f64());

    let Err(err) = result else {
        debug!(message_type, "message handled");
        return Ok(());
    };
    counter!(SESSION_ERRORS_TOTAL, "kind" => err.kind_label()).increment(1);
    match err {
        SessionError::Protocol(err) => {
            warn!(message_type, error = %err, "rejected client message");
            let _ = connection.send_message(&OutboundMessage::from_protocol_error(&err));
            Ok(())
        }
        SessionError::UnsupportedInput(reason) => {
            warn!(message_type, reason, "ignoring unsupported input");
            Ok(())
        }
        SessionError::Remote(err) => Err(err),
    }
}
