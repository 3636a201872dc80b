//! Binding variants and their installed form.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::describe::AnyArc;
use crate::error::InjectResult;
use crate::key::Key;
use crate::verify::Coercion;

/// Producer of a constructor binding: resolved inputs in, erased value out.
///
/// For plain constructors the value is already coerced into the bound key's
/// storage form; memoized producers return the constructor's own value.
pub(crate) type Producer = Arc<dyn Fn(Vec<AnyArc>) -> InjectResult<AnyArc> + Send + Sync>;

/// How one key is fulfilled, as declared in a module.
#[derive(Clone)]
pub(crate) enum Binding {
    /// Delegates to the untagged key of another type in the same module
    Alias { target: Key, coercion: Coercion },
    /// An already constructed value
    Fixed(AnyArc),
    /// Invoked on every resolution
    Constructor(ConstructorBinding),
    /// Invoked at most once per injector, shared by every key of the group
    Memoized {
        group: Arc<MemoGroup>,
        coercion: Coercion,
    },
}

#[derive(Clone)]
pub(crate) struct ConstructorBinding {
    pub(crate) inputs: Vec<Key>,
    pub(crate) producer: Producer,
}

impl ConstructorBinding {
    pub(crate) fn new(inputs: Vec<Key>, producer: Producer) -> Self {
        Self { inputs, producer }
    }
}

/// One memoized constructor declared for one or more keys.
///
/// Keys of the same group read the same cell; `anchor` names the group on
/// the resolution stack.
pub(crate) struct MemoGroup {
    pub(crate) anchor: Key,
    pub(crate) constructor: ConstructorBinding,
}

impl MemoGroup {
    pub(crate) fn new(anchor: Key, constructor: ConstructorBinding) -> Self {
        Self { anchor, constructor }
    }
}

pub(crate) type MemoCell = Arc<OnceCell<InjectResult<AnyArc>>>;

/// The memo cells of one injector, one per group.
#[derive(Default)]
pub(crate) struct MemoCells {
    cells: HashMap<usize, MemoCell>,
}

impl MemoCells {
    fn cell_for(&mut self, group: &Arc<MemoGroup>) -> MemoCell {
        let id = Arc::as_ptr(group) as usize;
        Arc::clone(self.cells.entry(id).or_default())
    }
}

impl Binding {
    pub(crate) fn kind(&self) -> BindingKind {
        match self {
            Binding::Alias { .. } => BindingKind::Alias,
            Binding::Fixed(_) => BindingKind::Fixed,
            Binding::Constructor(_) => BindingKind::Constructor,
            Binding::Memoized { .. } => BindingKind::Memoized,
        }
    }

    /// Alias target, if this is an alias.
    pub(crate) fn alias_target(&self) -> Option<&Key> {
        match self {
            Binding::Alias { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Alias { target, .. } => {
                f.debug_struct("Alias").field("target", target).finish()
            }
            Binding::Fixed(_) => f.write_str("Fixed"),
            Binding::Constructor(c) => {
                f.debug_struct("Constructor").field("inputs", &c.inputs).finish()
            }
            Binding::Memoized { group, .. } => f
                .debug_struct("Memoized")
                .field("anchor", &group.anchor)
                .field("inputs", &group.constructor.inputs)
                .finish(),
        }
    }
}

/// The variant a key is bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum BindingKind {
    Alias,
    Fixed,
    Constructor,
    Memoized,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingKind::Alias => "alias",
            BindingKind::Fixed => "fixed",
            BindingKind::Constructor => "constructor",
            BindingKind::Memoized => "memoized",
        };
        f.write_str(name)
    }
}

/// A binding as owned by an injector.
///
/// Memoized bindings get their one-shot cell here, so every injector built
/// from the same module caches independently.
pub(crate) enum ResolvedBinding {
    Alias { target: Key, coercion: Coercion },
    Fixed(AnyArc),
    Constructor(ConstructorBinding),
    Memoized {
        group: Arc<MemoGroup>,
        coercion: Coercion,
        cell: MemoCell,
    },
}

impl ResolvedBinding {
    pub(crate) fn kind(&self) -> BindingKind {
        match self {
            ResolvedBinding::Alias { .. } => BindingKind::Alias,
            ResolvedBinding::Fixed(_) => BindingKind::Fixed,
            ResolvedBinding::Constructor(_) => BindingKind::Constructor,
            ResolvedBinding::Memoized { .. } => BindingKind::Memoized,
        }
    }

    /// Keys this binding resolves before producing its own value.
    pub(crate) fn dependencies(&self) -> &[Key] {
        match self {
            ResolvedBinding::Alias { target, .. } => std::slice::from_ref(target),
            ResolvedBinding::Fixed(_) => &[],
            ResolvedBinding::Constructor(c) => &c.inputs,
            ResolvedBinding::Memoized { group, .. } => &group.constructor.inputs,
        }
    }

    /// Installs a declared binding, taking its memo cell from `cells`.
    pub(crate) fn install(binding: Binding, cells: &mut MemoCells) -> Self {
        match binding {
            Binding::Alias { target, coercion } => ResolvedBinding::Alias { target, coercion },
            Binding::Fixed(value) => ResolvedBinding::Fixed(value),
            Binding::Constructor(c) => ResolvedBinding::Constructor(c),
            Binding::Memoized { group, coercion } => ResolvedBinding::Memoized {
                cell: cells.cell_for(&group),
                group,
                coercion,
            },
        }
    }
}
