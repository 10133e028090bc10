//! Per-connection loop: read → accumulate → parse → dispatch → reset.
//!
//! Любая ошибка (read, malformed, рост, dispatch) завершает только это соединение;
//! буфер освобождается при выходе (RAII), сокет закрывает владелец.

use std::io::{ErrorKind as IoErrorKind, Read, Write};

use log::{debug, trace, warn};

use crate::error::{ImgfsError, Result};
use crate::http::frame::FrameAccumulator;
use crate::http::parser::{MessageParser, ParseOutcome};
use crate::metrics;

/// Dispatcher seam: performs the store operation for a complete message and
/// writes the reply to the connection.
pub trait Dispatcher<M>: Send + Sync {
    fn handle(&self, msg: &M, conn: &mut dyn Write) -> Result<()>;
}

impl<M, F> Dispatcher<M> for F
where
    F: Fn(&M, &mut dyn Write) -> Result<()> + Send + Sync,
{
    fn handle(&self, msg: &M, conn: &mut dyn Write) -> Result<()> {
        self(msg, conn)
    }
}

/// Обслужить соединение до конца. Ok(n): число обработанных сообщений
/// (пир закрыл соединение чисто, между сообщениями).
/// Чистое закрытие после хотя бы одного сообщения даёт Ok(served); закрытие
/// до первого сообщения или посреди сообщения даёт ConnectionClosed (Io).
pub fn handle_connection<S, P, D>(
    stream: &mut S,
    parser: &P,
    dispatcher: &D,
    initial_capacity: usize,
) -> Result<usize>
where
    S: Read + Write,
    P: MessageParser + ?Sized,
    D: Dispatcher<P::Message> + ?Sized,
{
    let mut acc = FrameAccumulator::with_capacity(initial_capacity)?;
    let mut served = 0usize;

    loop {
        if acc.is_exhausted() {
            warn!(
                "connection: buffer exhausted at {} bytes (header_complete={}, content_len={})",
                acc.capacity(),
                acc.header_complete(),
                acc.content_len()
            );
            return Err(ImgfsError::CapacityExhausted(acc.capacity()));
        }

        let n = match stream.read(acc.spare_mut()) {
            Ok(0) if served > 0 && acc.is_empty() => {
                debug!("connection: peer closed after {} message(s)", served);
                return Ok(served);
            }
            Ok(0) => return Err(ImgfsError::ConnectionClosed),
            Ok(n) => n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        acc.advance(n);
        metrics::record_bytes_read(n);
        trace!("connection: +{} bytes, held={}", n, acc.len());

        match parser.parse(acc.filled())? {
            ParseOutcome::Incomplete { content_len } => {
                acc.on_incomplete(content_len)?;
            }
            ParseOutcome::Complete {
                message,
                content_len,
            } => {
                acc.mark_complete();
                if let Err(e) = dispatcher.handle(&message, stream) {
                    return Err(ImgfsError::Dispatch(e.to_string()));
                }
                metrics::record_message_dispatched();
                served += 1;
                debug!(
                    "connection: message #{} dispatched ({} body bytes)",
                    served, content_len
                );
                acc.reset();
            }
        }
    }
}
