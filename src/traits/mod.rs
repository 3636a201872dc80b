//! Core traits for querying an injector.

mod resolver;

pub use resolver::{Resolver, ResolverCore};
