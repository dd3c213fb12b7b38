/*!
 * Feed Server
 *
 * Request decoding, the producer/consumer dispatcher and response sinks.
 */

mod codec;
mod config;
mod dispatcher;
mod sink;
mod task;

pub use codec::{decode_stream, decode_task, encode_response, Command, Request, Response};
pub use config::{Mode, ServerConfig, USAGE};
pub use dispatcher::{DispatchReport, Dispatcher, ProducerExit};
pub use sink::{JsonLineSink, MemorySink, ResponseSink};
pub use task::{RequestId, Task, TaskKind};

use crate::core::errors::ServerResult;
use std::io::{Read, Write};

/// Serve JSON requests from `input`, writing JSON-line responses to `output`
///
/// Returns after DONE, end of input or the first malformed record, once all
/// queued work has been answered and flushed.
pub fn serve<R, W>(config: ServerConfig, input: R, output: W) -> ServerResult<DispatchReport>
where
    R: Read,
    W: Write + Send,
{
    let mut dispatcher = Dispatcher::new(config, JsonLineSink::new(output));
    dispatcher.run(decode_stream(input))
}
