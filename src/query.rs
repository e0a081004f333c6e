//! Query directives: the embedded `{module}/action[/target]?params` language and
//! the dispatcher that routes parsed directives to backends.

pub mod directive;
pub mod dispatch;

pub use directive::{Params, Query};
pub use dispatch::{merge_params, Dispatcher};
