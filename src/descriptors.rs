//! Binding descriptors for introspection and diagnostics.

use crate::binding::BindingKind;
use crate::key::Key;

/// What an injector holds for one of its own keys.
///
/// Returned by [`Injector::descriptors`](crate::Injector::descriptors) in
/// install order. Useful for debugging a graph or dumping it at startup.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{injectable, BindingKind, Injector, Key, Module};
/// use std::sync::Arc;
///
/// pub struct Database;
/// injectable!(Database);
///
/// pub struct Repository {
///     pub db: Arc<Database>,
/// }
/// injectable!(Repository);
///
/// let mut module = Module::new();
/// module.bind::<Database>().to_singleton(Database);
/// module
///     .bind::<Repository>()
///     .to_constructor(|db: Arc<Database>| Ok::<_, std::io::Error>(Repository { db }));
///
/// let injector = Injector::new([module]).unwrap();
/// let descriptors = injector.descriptors();
///
/// let repo = &descriptors[1];
/// assert_eq!(repo.kind, BindingKind::Constructor);
/// assert_eq!(repo.dependencies, vec![Key::of::<Database>()]);
/// assert!(repo.type_name().contains("Repository"));
/// assert!(!repo.is_tagged());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    /// The bound key
    pub key: Key,
    /// Binding variant
    pub kind: BindingKind,
    /// Keys resolved before this binding produces a value
    pub dependencies: Vec<Key>,
}

impl BindingDescriptor {
    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }

    pub fn tag(&self) -> Option<&str> {
        self.key.tag()
    }

    pub fn is_tagged(&self) -> bool {
        self.key.is_tagged()
    }

    /// Whether resolving this key never runs a producer more than once.
    pub fn is_shared(&self) -> bool {
        matches!(self.kind, BindingKind::Fixed | BindingKind::Memoized)
    }
}
