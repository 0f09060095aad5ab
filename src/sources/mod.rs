pub mod googlevideo;
pub mod manager;
pub mod plugin;
pub mod query;
pub mod resolver;
pub mod soundcloud;
pub mod spotify;
pub mod stream;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

pub use manager::SourceManager;
pub use plugin::{BoxedSource, SourcePlugin};
pub use resolver::QueryResolver;
pub use stream::{ExtractionFailure, StreamChain, StreamResolver, StreamStrategy};
