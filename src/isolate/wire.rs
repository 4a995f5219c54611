//! Worker report codec: `u64` little-endian length, then a JSON body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::time::Duration;

use super::IsolationError;
use crate::poll::{ConfigError, Observed, PollError};

/// A poll outcome in a form that survives the process boundary.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum Report<T, E> {
    Success(T),
    Config(ConfigError),
    AttemptsExhausted {
        max_tries: u32,
        history: Vec<Observed<T, E>>,
    },
    DeadlineExceeded {
        timeout: Duration,
        history: Vec<Observed<T, E>>,
    },
    HardTimeout {
        timeout: Duration,
    },
    Operation(E),
    Isolation(String),
}

impl<T, E> From<Result<T, PollError<T, E>>> for Report<T, E> {
    fn from(outcome: Result<T, PollError<T, E>>) -> Self {
        match outcome {
            Ok(value) => Report::Success(value),
            Err(PollError::Config(e)) => Report::Config(e),
            Err(PollError::AttemptsExhausted { max_tries, history }) => {
                Report::AttemptsExhausted { max_tries, history }
            }
            Err(PollError::DeadlineExceeded { timeout, history }) => {
                Report::DeadlineExceeded { timeout, history }
            }
            Err(PollError::HardTimeout { timeout }) => Report::HardTimeout { timeout },
            Err(PollError::Operation(e)) => Report::Operation(e),
            Err(PollError::Isolation(e)) => Report::Isolation(e.to_string()),
        }
    }
}

impl<T, E> Report<T, E> {
    pub(crate) fn into_outcome(self) -> Result<T, PollError<T, E>> {
        match self {
            Report::Success(value) => Ok(value),
            Report::Config(e) => Err(PollError::Config(e)),
            Report::AttemptsExhausted { max_tries, history } => {
                Err(PollError::AttemptsExhausted { max_tries, history })
            }
            Report::DeadlineExceeded { timeout, history } => {
                Err(PollError::DeadlineExceeded { timeout, history })
            }
            Report::HardTimeout { timeout } => Err(PollError::HardTimeout { timeout }),
            Report::Operation(e) => Err(PollError::Operation(e)),
            Report::Isolation(msg) => Err(PollError::Isolation(IsolationError::Remote(msg))),
        }
    }
}

/// Encode a report as one frame. If the payload cannot be serialized the
/// frame carries that failure instead.
pub(crate) fn encode<T: Serialize, E: Serialize>(report: &Report<T, E>) -> Vec<u8> {
    let body = serde_json::to_vec(report)
        .or_else(|e| {
            serde_json::to_vec(&Report::<T, E>::Isolation(format!(
                "failed to encode worker report: {}",
                e
            )))
        })
        .unwrap_or_default();
    let mut frame = Vec::with_capacity(8 + body.len());
    frame.extend_from_slice(&(body.len() as u64).to_le_bytes());
    frame.extend_from_slice(&body);
    frame
}

/// Read one frame body. Does not wait for EOF, so a pipe end leaked into
/// another process cannot stall the reader once the frame is complete.
pub(crate) fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len = [0u8; 8];
    reader.read_exact(&mut len)?;
    let len = usize::try_from(u64::from_le_bytes(len))
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame length overflow"))?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(body)
}

pub(crate) fn decode<T: DeserializeOwned, E: DeserializeOwned>(
    body: &[u8],
) -> Result<Report<T, E>, serde_json::Error> {
    serde_json::from_slice(body)
}
