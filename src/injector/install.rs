//! Flattening modules into one validated binding map.

use std::collections::{HashMap, HashSet};

use crate::binding::{Binding, MemoCells, ResolvedBinding};
use crate::error::{BindingError, ErrorKind};
use crate::injector::{BindingMap, Injector};
use crate::internal::circular::{cycle_error, find_cycle};
use crate::key::Key;
use crate::module::Module;

/// Bindings and eager keys collected from a list of modules.
pub(super) struct Graph {
    pub(super) bindings: BindingMap,
    pub(super) order: Vec<Key>,
    pub(super) eager: Vec<Key>,
    cells: MemoCells,
}

impl Graph {
    pub(super) fn new() -> Self {
        Self {
            bindings: BindingMap::default(),
            order: Vec::new(),
            eager: Vec::new(),
            cells: MemoCells::default(),
        }
    }

    /// Installs one module, rejecting it whole on the first problem.
    pub(super) fn install(
        &mut self,
        index: usize,
        module: Module,
        parent: Option<&Injector>,
    ) -> Result<(), BindingError> {
        let Module {
            bindings,
            errors,
            eager,
        } = module;

        if !errors.is_empty() {
            return Err(BindingError::aggregate(errors).tag("module", index));
        }

        let mut own: HashMap<&Key, &Binding> = HashMap::with_capacity(bindings.len());
        for (key, binding) in &bindings {
            let taken = own.contains_key(key)
                || self.bindings.contains_key(key)
                || parent.map_or(false, |p| p.contains(key));
            if taken {
                return Err(BindingError::new(ErrorKind::AlreadyBound)
                    .key(key)
                    .tag("module", index));
            }
            own.insert(key, binding);
        }

        for (key, binding) in &bindings {
            if binding.alias_target().is_some() {
                check_alias_chain(key, &own).map_err(|err| err.tag("module", index))?;
            }
        }

        tracing::debug!(module = index, bindings = bindings.len(), "installing module");
        for (key, binding) in bindings {
            self.order.push(key.clone());
            let resolved = ResolvedBinding::install(binding, &mut self.cells);
            self.bindings.insert(key, resolved);
        }
        for key in eager {
            if !self.eager.contains(&key) {
                self.eager.push(key);
            }
        }
        Ok(())
    }

    /// Every constructor input must be bound here or in the parent.
    pub(super) fn validate_inputs(&self, parent: Option<&Injector>) -> Result<(), BindingError> {
        for key in &self.order {
            let Some(binding) = self.bindings.get(key) else {
                continue;
            };
            for input in binding.dependencies() {
                let bound = self.bindings.contains_key(input)
                    || parent.map_or(false, |p| p.contains(input));
                if !bound {
                    return Err(BindingError::new(ErrorKind::NoBinding)
                        .key(input)
                        .tag("required_by", key));
                }
            }
        }
        Ok(())
    }

    /// Rejects any key that transitively depends on itself.
    pub(super) fn detect_cycles(&self) -> Result<(), BindingError> {
        let cycle = find_cycle(&self.order, |key| {
            self.bindings.get(key).map(ResolvedBinding::dependencies)
        });
        match cycle {
            Some(path) => Err(cycle_error(&path)),
            None => Ok(()),
        }
    }
}

/// Follows an alias chain within its module until a value-producing binding.
fn check_alias_chain(start: &Key, own: &HashMap<&Key, &Binding>) -> Result<(), BindingError> {
    let mut seen: HashSet<&Key> = HashSet::new();
    let mut path: Vec<Key> = vec![start.clone()];
    seen.insert(start);

    let mut current = start;
    while let Some(target) = own.get(current).and_then(|binding| binding.alias_target()) {
        path.push(target.clone());
        if !seen.insert(target) {
            return Err(cycle_error(&path));
        }
        match own.get(target) {
            Some(_) => current = target,
            None => {
                return Err(BindingError::new(ErrorKind::NoFinalBinding)
                    .key(start)
                    .tag("target", target))
            }
        }
    }
    Ok(())
}
