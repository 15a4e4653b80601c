//! # Result shape of a service's `serve` operation.
//!
//! ```text
//! Serving::Completed(None)        → finished cleanly, nothing forwarded
//! Serving::Completed(Some(err))   → finished with err, forwarded once
//! Serving::Streaming(stream)      → every item forwarded until the stream ends
//! ```

use futures::{Stream, StreamExt, stream::BoxStream};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ServiceError;

/// Stream of errors reported by a streaming service.
pub type ErrorStream = BoxStream<'static, ServiceError>;

/// What `serve` returned.
pub enum Serving {
    /// The work is already done; carries its error, if any.
    Completed(Option<ServiceError>),
    /// The work continues; every error is reported on the stream, which ends with the work.
    Streaming(ErrorStream),
}

impl Serving {
    /// Completed without error.
    pub fn done() -> Self {
        Serving::Completed(None)
    }

    /// Completed with `err`.
    pub fn failed(err: ServiceError) -> Self {
        Serving::Completed(Some(err))
    }

    /// Streams the errors sent on `rx` until every sender is dropped.
    pub fn from_receiver(rx: mpsc::Receiver<ServiceError>) -> Self {
        Serving::Streaming(ReceiverStream::new(rx).boxed())
    }

    /// Streams the items of `stream`.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = ServiceError> + Send + 'static,
    {
        Serving::Streaming(stream.boxed())
    }

    /// `true` for [`Serving::Streaming`].
    pub fn is_streaming(&self) -> bool {
        matches!(self, Serving::Streaming(_))
    }
}

impl From<Result<(), ServiceError>> for Serving {
    fn from(res: Result<(), ServiceError>) -> Self {
        Serving::Completed(res.err())
    }
}
