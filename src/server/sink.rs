/*!
 * Response Sinks
 *
 * Consumers share one sink. A sink serializes whole records so responses
 * never interleave mid-record; the relative order of responses from
 * different consumers is unspecified.
 */

use super::codec::{encode_response, Response};
use crate::core::errors::ServerResult;
use parking_lot::Mutex;
use std::io::Write;

/// Destination for responses, shared by every consumer
pub trait ResponseSink: Send + Sync {
    /// Emit one complete response record
    fn emit(&self, response: &Response) -> ServerResult<()>;

    /// Push buffered records to the underlying writer
    fn flush(&self) -> ServerResult<()> {
        Ok(())
    }
}

impl<S: ResponseSink + ?Sized> ResponseSink for &S {
    fn emit(&self, response: &Response) -> ServerResult<()> {
        (**self).emit(response)
    }

    fn flush(&self) -> ServerResult<()> {
        (**self).flush()
    }
}

/// Writes one JSON object per line
pub struct JsonLineSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> ResponseSink for JsonLineSink<W> {
    fn emit(&self, response: &Response) -> ServerResult<()> {
        // Encode outside the lock; only the write is serialized
        let mut line = encode_response(response)?;
        line.push(b'\n');
        self.out.lock().write_all(&line)?;
        Ok(())
    }

    fn flush(&self) -> ServerResult<()> {
        self.out.lock().flush()?;
        Ok(())
    }
}

/// Collects responses in memory
#[derive(Default)]
pub struct MemorySink {
    responses: Mutex<Vec<Response>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the responses emitted so far, in emission order
    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.responses.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_responses(self) -> Vec<Response> {
        self.responses.into_inner()
    }
}

impl ResponseSink for MemorySink {
    fn emit(&self, response: &Response) -> ServerResult<()> {
        self.responses.lock().push(response.clone());
        Ok(())
    }
}
