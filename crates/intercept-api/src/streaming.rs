//! Asynchronous enumeration surface.
//!
//! Backends that can stream hand out a [`RowStream`]; the interception
//! layer preserves it end-to-end instead of forcing materialization.
//! Cancellation is cooperative: dropping the stream cancels the
//! enumeration, no explicit token is threaded through.

use std::pin::Pin;

use tokio_stream::Stream;

use crate::error::Result;

/// A pinned, boxed stream of rows. The only suspension points live inside
/// the backing provider; expression rewriting happens before the stream
/// is constructed.
pub type RowStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Adapt already-materialized rows into a [`RowStream`].
///
/// Useful for sources that have no incremental cursor of their own but
/// still want to satisfy the streaming capability.
pub fn from_rows<T>(rows: Vec<T>) -> RowStream<T>
where
    T: Send + 'static,
{
    Box::pin(tokio_stream::iter(rows.into_iter().map(Ok)))
}
