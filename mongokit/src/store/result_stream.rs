use crate::collection::Document;
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An open, forward only stream of result documents.
///
/// A stream holds a server side resource until [ResultStream::close] is
/// called.
pub trait ResultStream: Send {
    /// Whether another document is available. May fetch the next batch.
    fn has_next(&mut self) -> MongoKitResult<bool>;

    /// The next document, or `None` when the stream is exhausted.
    fn next_document(&mut self) -> MongoKitResult<Option<Document>>;

    /// Releases the stream. Calling it again is an error.
    fn close(&mut self) -> MongoKitResult<()>;
}

/// Shared counters of opened and closed streams, for inspection.
#[derive(Clone, Debug, Default)]
pub struct StreamTracker {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl StreamTracker {
    pub fn new() -> Self {
        StreamTracker::default()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Streams opened and not closed yet.
    pub fn open(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }
}

/// A [ResultStream] over documents that are already materialized.
pub struct VecResultStream {
    documents: VecDeque<Document>,
    closed: bool,
    tracker: Option<StreamTracker>,
}

impl VecResultStream {
    pub fn new(documents: Vec<Document>) -> Self {
        VecResultStream {
            documents: documents.into(),
            closed: false,
            tracker: None,
        }
    }

    /// A stream that reports its open and close to `tracker`.
    pub fn tracked(documents: Vec<Document>, tracker: &StreamTracker) -> Self {
        tracker.opened.fetch_add(1, Ordering::SeqCst);
        VecResultStream {
            documents: documents.into(),
            closed: false,
            tracker: Some(tracker.clone()),
        }
    }

    fn ensure_open(&self) -> MongoKitResult<()> {
        if self.closed {
            log::error!("Result stream is already closed");
            return Err(MongoKitError::new(
                "Result stream is already closed",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

impl ResultStream for VecResultStream {
    fn has_next(&mut self) -> MongoKitResult<bool> {
        self.ensure_open()?;
        Ok(!self.documents.is_empty())
    }

    fn next_document(&mut self) -> MongoKitResult<Option<Document>> {
        self.ensure_open()?;
        Ok(self.documents.pop_front())
    }

    fn close(&mut self) -> MongoKitResult<()> {
        self.ensure_open()?;
        self.closed = true;
        self.documents.clear();
        if let Some(tracker) = &self.tracker {
            tracker.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
