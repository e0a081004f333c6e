//! Context domain: template classification, recursive resolution and page
//! context assembly.

pub mod page;
pub mod resolver;
pub mod template;

pub use page::{PageContext, PageOptions, TemplateLoader};
pub use resolver::{unwrap_envelope, Resolver, ResolverOptions};
pub use template::{DirectiveNode, TemplateNode};
