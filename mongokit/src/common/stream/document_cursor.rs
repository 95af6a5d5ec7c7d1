use crate::aggregate::Stage;
use crate::collection::Document;
use crate::common::{ProjectionSpec, SortSpec};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::store::{FindQuery, ResultStream, StoreCollection};
use std::fmt::{Debug, Formatter};
use std::iter::once;

/// What a cursor was opened from; derived cursors re-issue it.
#[derive(Clone, Debug)]
pub(crate) enum CursorSource {
    Find(FindQuery),
    Aggregate(Vec<Document>),
    ListIndexes,
}

fn closed_error() -> MongoKitError {
    log::error!("Cursor is closed");
    MongoKitError::new("Cursor is closed", ErrorKind::CursorClosed)
}

/// A forward only cursor over the documents of a query.
///
/// A cursor owns an open [ResultStream] and is either open or closed; once
/// closed it stays closed. With auto-close on (the default) the cursor
/// closes itself as soon as [DocumentCursor::has_next] finds the stream
/// exhausted. Dropping an open cursor closes it as well.
///
/// # Examples
///
/// ```rust,ignore
/// let mut cursor = collection.find(&field("age").gt(30)?)?;
/// while cursor.has_next()? {
///     let document = cursor.next_document()?;
///     println!("{}", document);
/// }
/// assert!(cursor.is_closed());
/// ```
///
/// Iterating pulls through `has_next`, so exhausting the iterator closes the
/// cursor too:
///
/// ```rust,ignore
/// let names: MongoKitResult<Vec<Document>> = collection.find_all()?.collect();
/// ```
pub struct DocumentCursor {
    collection: StoreCollection,
    source: CursorSource,
    stream: Box<dyn ResultStream>,
    closed: bool,
    auto_close: bool,
    exhausted: bool,
    closed_reported: bool,
}

impl DocumentCursor {
    pub(crate) fn new(collection: StoreCollection, source: CursorSource, stream: Box<dyn ResultStream>) -> Self {
        DocumentCursor {
            collection,
            source,
            stream,
            closed: false,
            auto_close: true,
            exhausted: false,
            closed_reported: false,
        }
    }

    /// Issues `source` against `collection` and wraps the resulting stream.
    pub(crate) fn open(collection: &StoreCollection, source: CursorSource) -> MongoKitResult<Self> {
        let stream = match &source {
            CursorSource::Find(query) => collection.find(query)?,
            CursorSource::Aggregate(stages) => collection.aggregate(stages)?,
            CursorSource::ListIndexes => collection.list_indexes()?,
        };
        Ok(DocumentCursor::new(collection.clone(), source, stream))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_auto_close(&self) -> bool {
        self.auto_close
    }

    /// Turns implicit closing on exhaustion on or off.
    pub fn set_auto_close(&mut self, auto_close: bool) -> &mut Self {
        self.auto_close = auto_close;
        self
    }

    /// Whether another document is available. Always `false` once closed.
    pub fn has_next(&mut self) -> MongoKitResult<bool> {
        if self.closed {
            return Ok(false);
        }

        let more = self.stream.has_next()?;
        if !more {
            self.exhausted = true;
            if self.auto_close {
                if let Err(err) = self.teardown() {
                    log::error!("Error while auto-closing exhausted cursor: {}", err);
                }
            }
        }
        Ok(more)
    }

    /// Returns the next document.
    ///
    /// Fails with `CursorClosed` on a closed cursor and with `NotFound` when
    /// the stream has nothing left; call [DocumentCursor::has_next] first.
    pub fn next_document(&mut self) -> MongoKitResult<Document> {
        if self.closed {
            return Err(closed_error());
        }

        match self.stream.next_document()? {
            Some(document) => Ok(document),
            None => {
                self.exhausted = true;
                log::error!("No more documents in cursor");
                Err(MongoKitError::new("No more documents in cursor", ErrorKind::NotFound))
            }
        }
    }

    /// Closes the cursor. Only the first call releases the stream; later
    /// calls do nothing. The cursor is closed even when releasing fails.
    pub fn close(&mut self) -> MongoKitResult<()> {
        if self.closed {
            return Ok(());
        }
        self.teardown()
    }

    fn teardown(&mut self) -> MongoKitResult<()> {
        self.closed = true;
        self.stream.close()
    }

    /// Moves every remaining document into `target` and closes the cursor
    /// whatever the auto-close setting. Returns the number of documents
    /// moved.
    pub fn drain_into<E: Extend<Document>>(&mut self, target: &mut E) -> MongoKitResult<usize> {
        if self.closed {
            return if self.exhausted { Ok(0) } else { Err(closed_error()) };
        }

        let mut drained = 0;
        let outcome = loop {
            match self.stream.has_next() {
                Ok(true) => match self.stream.next_document() {
                    Ok(Some(document)) => {
                        target.extend(once(document));
                        drained += 1;
                    }
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(err),
                },
                Ok(false) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        if outcome.is_ok() {
            self.exhausted = true;
        }
        if let Err(err) = self.teardown() {
            log::error!("Error while closing drained cursor: {}", err);
        }
        outcome.map(|_| drained)
    }

    /// A new cursor skipping `skip` documents of this cursor's source.
    pub fn with_skip(&self, skip: u64) -> MongoKitResult<DocumentCursor> {
        self.derive(|query| query.with_skip(skip), || Stage::skip(skip))
    }

    /// A new cursor returning at most `limit` documents. `0` means no limit
    /// for find sources.
    pub fn with_limit(&self, limit: u64) -> MongoKitResult<DocumentCursor> {
        self.derive(|query| query.with_limit(limit), || Stage::limit(limit))
    }

    pub fn with_sort(&self, sort: &SortSpec) -> MongoKitResult<DocumentCursor> {
        self.derive(|query| query.with_sort(sort), || Stage::sort(sort))
    }

    pub fn with_projection(&self, projection: &ProjectionSpec) -> MongoKitResult<DocumentCursor> {
        self.derive(
            |query| query.with_projection(projection),
            || Stage::project(projection),
        )
    }

    fn derive<Q, S>(&self, refine: Q, stage: S) -> MongoKitResult<DocumentCursor>
    where
        Q: FnOnce(&FindQuery) -> FindQuery,
        S: FnOnce() -> Stage,
    {
        let source = match &self.source {
            CursorSource::Find(query) => CursorSource::Find(refine(query)),
            CursorSource::Aggregate(stages) => {
                let mut stages = stages.clone();
                stages.push(stage().to_document());
                CursorSource::Aggregate(stages)
            }
            CursorSource::ListIndexes => {
                log::error!("Index listing cursors cannot be refined");
                return Err(MongoKitError::new(
                    "Index listing cursors cannot be refined",
                    ErrorKind::InvalidOperation,
                ));
            }
        };
        DocumentCursor::open(&self.collection, source)
    }
}

impl Debug for DocumentCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCursor")
            .field("collection", &self.collection.name())
            .field("source", &self.source)
            .field("closed", &self.closed)
            .field("auto_close", &self.auto_close)
            .finish()
    }
}

impl Iterator for DocumentCursor {
    type Item = MongoKitResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            if self.exhausted || self.closed_reported {
                return None;
            }
            self.closed_reported = true;
            return Some(Err(closed_error()));
        }

        match self.has_next() {
            Ok(true) => Some(self.next_document()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl Drop for DocumentCursor {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.teardown() {
                log::error!("Error while closing dropped cursor: {}", err);
            }
        }
    }
}
