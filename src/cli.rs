//! CLI domain: parse, route and output only.
//! Resolution itself lives in the context, query and store modules.

mod output;
mod parse;
mod route;

pub use output::{map_error, to_pretty_json};
pub use parse::{parse_param, Cli, Commands};
pub use route::RunContext;
