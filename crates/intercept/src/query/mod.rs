//! Query objects and the contracts a backing data source satisfies.

mod base;
mod intercepted;
mod provider;

pub use base::Query;
pub use intercepted::{InterceptProvider, InterceptQuery};
pub use provider::{EagerLoadSource, QueryProvider, StreamSource};
