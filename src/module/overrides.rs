//! Substituting bindings of an existing module.

use std::collections::HashSet;

use crate::key::Key;
use crate::module::Module;

/// Merge of a source module with override modules.
///
/// The result starts as a copy of the source. Each override, in order,
/// replaces every declaration for the keys it declares; keys that only one
/// side declares are kept. Declaration errors and eager keys of all modules
/// are concatenated. No input module is modified.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{injectable, Injector, Module, Override, Resolver};
///
/// pub struct Mailer(&'static str);
/// injectable!(Mailer);
///
/// let mut production = Module::new();
/// production.bind::<Mailer>().to_singleton(Mailer("smtp"));
///
/// let mut testing = Module::new();
/// testing.bind::<Mailer>().to_singleton(Mailer("memory"));
///
/// let merged = Override::of(&production).with([&testing]);
/// let injector = Injector::new([merged]).unwrap();
/// assert_eq!(injector.get::<Mailer>().unwrap().0, "memory");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Override<'a> {
    source: &'a Module,
}

impl<'a> Override<'a> {
    pub fn of(source: &'a Module) -> Self {
        Self { source }
    }

    /// Applies `overrides` in order; the last one wins on shared keys.
    pub fn with<'o, I>(self, overrides: I) -> Module
    where
        I: IntoIterator<Item = &'o Module>,
    {
        let mut merged = self.source.clone();
        for over in overrides {
            apply(&mut merged, over);
        }
        merged
    }
}

fn apply(merged: &mut Module, over: &Module) {
    let declared: HashSet<&Key> = over.keys().collect();
    let mut placed: HashSet<Key> = HashSet::new();
    let mut bindings = Vec::with_capacity(merged.bindings.len() + over.bindings.len());

    for (key, binding) in merged.bindings.drain(..) {
        if !declared.contains(&key) {
            bindings.push((key, binding));
        } else if placed.insert(key.clone()) {
            // Replacement takes the place of the first replaced declaration.
            bindings.extend(over.bindings.iter().filter(|(k, _)| *k == key).cloned());
        }
    }
    bindings.extend(
        over.bindings
            .iter()
            .filter(|(k, _)| !placed.contains(k))
            .cloned(),
    );

    tracing::debug!(
        replaced = placed.len(),
        declared = declared.len(),
        "override applied"
    );
    merged.bindings = bindings;
    merged.errors.extend(over.errors.iter().cloned());
    merged.eager.extend(over.eager.iter().cloned());
}
