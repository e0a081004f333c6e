//! Trellis: declarative page context resolution
//!
//! A context template is a JSON tree whose nodes either declare a query
//! directive (`{"_query": "{cms}/list/article", "_process": [...]}`), a literal
//! (`{"_data": ...}`), or plain structure. Resolution fetches every directive
//! concurrently from a content store or generator, runs the declared transform
//! chain over each result and splices it back in place, producing a data tree
//! of the same shape ready for rendering.

pub mod cli;
pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod generators;
pub mod logging;
pub mod process;
pub mod query;
pub mod store;
pub mod value;

pub use context::{PageContext, PageOptions, Resolver, ResolverOptions, TemplateLoader};
pub use error::{ApiError, ProcessError, QueryError, ResolveError, StoreError};
pub use query::{Dispatcher, Params, Query};
pub use store::{ContentStore, MemoryStore};
