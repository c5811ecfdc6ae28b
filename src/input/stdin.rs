//! Bounded-wait stdin reading.
//!
//! The status line is usually fed by a pipe, but it may also be started with
//! nothing attached to stdin. When no byte arrives within the wait window the
//! read gives up and yields an empty JSON object instead of hanging.

use std::io::{ErrorKind, Read};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::error::StatuslineError;

/// Input used when nothing arrives on stdin in time.
pub const EMPTY_INPUT: &str = "{}";

enum Chunk {
    Data(Vec<u8>),
    End,
    Failed(std::io::Error),
}

/// Read all of stdin, waiting at most `wait` for the first byte.
pub fn read_stdin(wait: Duration) -> Result<String, StatuslineError> {
    read_with_timeout(std::io::stdin(), wait)
}

/// Read `reader` to the end on a helper thread.
///
/// Returns [`EMPTY_INPUT`] if the first chunk does not arrive within `wait`.
/// Once data starts flowing the read continues until end of stream.
pub fn read_with_timeout<R>(reader: R, wait: Duration) -> Result<String, StatuslineError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || pump(reader, tx));

    let mut buf = Vec::new();
    match rx.recv_timeout(wait) {
        Ok(Chunk::Data(bytes)) => buf.extend_from_slice(&bytes),
        Ok(Chunk::End) | Err(RecvTimeoutError::Disconnected) => return Ok(String::new()),
        Ok(Chunk::Failed(err)) => return Err(err.into()),
        Err(RecvTimeoutError::Timeout) => {
            tracing::debug!("no input on stdin after {:?}, using empty input", wait);
            return Ok(EMPTY_INPUT.to_string());
        }
    }

    for chunk in rx {
        match chunk {
            Chunk::Data(bytes) => buf.extend_from_slice(&bytes),
            Chunk::End => break,
            Chunk::Failed(err) => return Err(err.into()),
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn pump<R: Read>(mut reader: R, tx: Sender<Chunk>) {
    let mut chunk = [0u8; 8192];
    loop {
        let message = match reader.read(&mut chunk) {
            Ok(0) => Chunk::End,
            Ok(n) => Chunk::Data(chunk[..n].to_vec()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => Chunk::Failed(err),
        };
        let done = !matches!(message, Chunk::Data(_));
        if tx.send(message).is_err() || done {
            return;
        }
    }
}
