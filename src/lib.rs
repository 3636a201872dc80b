//! # ferrous-inject
//!
//! A runtime dependency-injection container built from verified declarations.
//!
//! Declarations are grouped into [`Module`]s: each one says how a *key* (a type,
//! optionally qualified by a string tag) is fulfilled. An [`Injector`] merges
//! modules into one flat, validated graph and resolves keys on demand, wiring
//! transitive dependencies automatically.
//!
//! ## Features
//!
//! - **Checked declarations**: interface satisfaction, assignability and
//!   constructor shape are verified when a binding is declared
//! - **Four binding variants**: aliases, fixed values, constructors and
//!   memoized constructors that run at most once per injector
//! - **Fail-fast graphs**: duplicate keys, dangling aliases, missing inputs and
//!   cycles are construction errors, never first-use surprises
//! - **Tags**: several bindings of one type told apart by a string
//! - **Function injection**: `call`, `call_tagged` and `populate`
//! - **Thread-safe**: an injector is `Send + Sync`; memoization is exactly-once
//!   under concurrent first access
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{interface, injectable, Injector, Module, Resolver};
//! use std::sync::Arc;
//!
//! pub trait Logger: Send + Sync {
//!     fn log(&self, message: &str) -> String;
//! }
//! interface!(dyn Logger);
//!
//! pub struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) -> String {
//!         format!("[LOG] {}", message)
//!     }
//! }
//! injectable!(ConsoleLogger: dyn Logger);
//!
//! pub struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//! injectable!(UserService);
//!
//! let mut module = Module::new();
//! module.bind::<ConsoleLogger>().to_singleton(ConsoleLogger);
//! module.bind::<dyn Logger>().to::<ConsoleLogger>();
//! module
//!     .bind::<UserService>()
//!     .to_constructor(|logger: Arc<dyn Logger>| Ok::<_, std::io::Error>(UserService { logger }));
//!
//! let injector = Injector::new([module]).unwrap();
//! let users = injector.get::<UserService>().unwrap();
//! assert_eq!(users.logger.log("ready"), "[LOG] ready");
//! ```
//!
//! ## Tagged Bindings
//!
//! ```rust
//! use ferrous_inject::{injectable, tagged_params, Injector, Module, Resolver};
//! use std::sync::Arc;
//!
//! pub struct Pool {
//!     pub url: &'static str,
//! }
//! injectable!(Pool);
//!
//! tagged_params! {
//!     pub struct Pools {
//!         #[tag = "primary"]
//!         pub primary: Arc<Pool>,
//!         #[tag = "replica"]
//!         pub replica: Arc<Pool>,
//!     }
//! }
//!
//! let mut module = Module::new();
//! module.bind_tagged::<Pool>("primary").to_singleton(Pool { url: "db-1" });
//! module.bind_tagged::<Pool>("replica").to_singleton(Pool { url: "db-2" });
//!
//! let injector = Injector::new([module]).unwrap();
//! let urls = injector
//!     .call_tagged(|pools: Pools| (pools.primary.url, pools.replica.url))
//!     .unwrap();
//! assert_eq!(urls, ("db-1", "db-2"));
//! assert!(injector.get::<Pool>().is_err());
//! ```
//!
//! ## Errors
//!
//! Every container failure is a [`BindingError`] with a stable [`ErrorKind`]
//! and diagnostic tags. Errors returned by your own constructors come back
//! unchanged as [`InjectError::Producer`].

pub mod binding;
pub mod callable;
pub mod config;
pub mod describe;
pub mod descriptors;
pub mod error;
pub mod injector;
pub mod key;
pub mod module;
pub mod traits;
pub mod verify;

// Internal modules
mod internal;

// Re-export core types
pub use binding::BindingKind;
pub use callable::{Callable, FieldSpec, TaggedParams};
pub use config::InjectorOptions;
pub use describe::{AnyArc, Capability, Describe, Slot, TypeDescriptor, TypeShape};
pub use descriptors::BindingDescriptor;
pub use error::{BindingError, ErrorKind, InjectError, InjectResult};
pub use injector::Injector;
pub use key::{key_of, Key};
pub use module::{Builder, Configure, Module, Override};
pub use traits::{Resolver, ResolverCore};
