/*!
 * Request/Response Codec
 *
 * JSON records in, JSON records out. Requests arrive as a stream of JSON
 * objects (newline separated or simply concatenated). Optional fields that
 * are missing, null or of the wrong type decode to their zero value; only the
 * `command` tag is strict.
 */

use super::task::{RequestId, Task};
use crate::core::errors::{ServerError, ServerResult};
use crate::feed::PostContent;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::io::Read;

/// Command tag of a request record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Add,
    Remove,
    Contains,
    Feed,
    Done,
}

/// A request record as it appears on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: RequestId,
    #[serde(default, deserialize_with = "lenient_body")]
    pub body: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: f64,
}

/// Any JSON number, truncated toward zero; anything else is 0
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RequestId, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|v| v as RequestId))
            .unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_body<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(body) => body,
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        _ => 0.0,
    })
}

impl From<Request> for Task {
    fn from(request: Request) -> Self {
        let Request {
            command,
            id,
            body,
            timestamp,
        } = request;
        match command {
            Command::Add => Task::Add {
                id,
                body,
                timestamp,
            },
            Command::Remove => Task::Remove { id, timestamp },
            Command::Contains => Task::Contains { id, timestamp },
            Command::Feed => Task::Feed { id },
            Command::Done => Task::Shutdown,
        }
    }
}

/// A response record
///
/// Keys are emitted in lexicographic order: `{"id":..,"success":..}` and
/// `{"feed":[..],"id":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Feed { feed: Vec<PostContent>, id: RequestId },
    Ack { id: RequestId, success: bool },
}

impl Response {
    #[inline]
    pub fn ack(id: RequestId, success: bool) -> Self {
        Response::Ack { id, success }
    }

    #[inline]
    pub fn feed(id: RequestId, feed: Vec<PostContent>) -> Self {
        Response::Feed { feed, id }
    }

    pub fn id(&self) -> RequestId {
        match self {
            Response::Feed { id, .. } | Response::Ack { id, .. } => *id,
        }
    }
}

/// Decode a single request record
pub fn decode_task(json: &str) -> ServerResult<Task> {
    let request: Request = serde_json::from_str(json)?;
    Ok(request.into())
}

/// Lazily decode a stream of request records into tasks
///
/// Yields one item per record. After a malformed record the stream may keep
/// yielding errors; callers stop at the first one.
pub fn decode_stream<R: Read>(reader: R) -> impl Iterator<Item = ServerResult<Task>> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<Request>()
        .map(|record| record.map(Task::from).map_err(ServerError::from))
}

/// Encode a response as one JSON line (without the trailing newline)
pub fn encode_response(response: &Response) -> ServerResult<Vec<u8>> {
    serde_json::to_vec(response).map_err(ServerError::Encode)
}
