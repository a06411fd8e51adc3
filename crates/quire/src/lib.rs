pub mod assets;
pub mod bundler;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod frontmatter;
pub mod loader;
pub mod parsing;
pub mod plugins;
pub mod publisher;
pub mod resolver;
pub mod search;
pub mod site;
pub mod sitemap;
pub mod theme;
pub mod types;

pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorState, Rebuild};
pub use error::*;
pub use parsing::MarkdownRenderer;
pub use plugins::{PagePostProcessor, PostProcessorRegistry};
pub use publisher::{CommandPaginator, Paginator};
pub use resolver::Resolver;
pub use site::*;
pub use types::*;
