//! Modules: portable sets of binding declarations.
//!
//! A [`Module`] is filled through [`Builder`]s obtained from [`Module::bind`]
//! and its variants. Declaration mistakes do not fail the call that made them;
//! they are kept with the module and reported together when the module is
//! installed into an [`Injector`](crate::Injector).

use std::sync::Arc;

use crate::binding::{Binding, BindingKind};
use crate::describe::Describe;
use crate::error::BindingError;
use crate::key::Key;

mod builder;
mod module_system;
mod overrides;

pub use builder::Builder;
pub use module_system::Configure;
pub use overrides::Override;

/// An ordered collection of binding declarations.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{injectable, Injector, Module, Resolver};
///
/// pub struct Settings {
///     pub name: &'static str,
/// }
/// injectable!(Settings);
///
/// let mut module = Module::new();
/// module.bind::<Settings>().to_singleton(Settings { name: "prod" });
/// module.bind_tagged_u16("port").to_singleton(8080u16);
///
/// let injector = Injector::new([module]).unwrap();
/// assert_eq!(injector.get::<Settings>().unwrap().name, "prod");
/// assert_eq!(injector.get_tagged_u16("port").unwrap(), 8080);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub(crate) bindings: Vec<(Key, Binding)>,
    pub(crate) errors: Vec<BindingError>,
    pub(crate) eager: Vec<Key>,
}

macro_rules! bind_tagged_primitives {
    ($($method:ident => $ty:ty),+ $(,)?) => {
        $(
            #[doc = concat!("Builder for a tagged `", stringify!($ty), "` key.")]
            pub fn $method(&mut self, tag: impl Into<Arc<str>>) -> Builder<'_> {
                self.bind_tagged::<$ty>(tag)
            }
        )+
    };
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with no keys yet; add them with [`Builder::and`] and
    /// [`Builder::and_tagged`]. Finalizing it without any key records `Nil`.
    pub fn builder(&mut self) -> Builder<'_> {
        Builder::new(self)
    }

    /// Builder for the untagged key of `T`.
    pub fn bind<T: ?Sized + Describe>(&mut self) -> Builder<'_> {
        Builder::new(self).and::<T>()
    }

    /// Builder for the key of `T` under `tag`.
    pub fn bind_tagged<T: ?Sized + Describe>(&mut self, tag: impl Into<Arc<str>>) -> Builder<'_> {
        Builder::new(self).and_tagged::<T>(tag)
    }

    bind_tagged_primitives! {
        bind_tagged_bool => bool,
        bind_tagged_char => char,
        bind_tagged_i8 => i8,
        bind_tagged_i16 => i16,
        bind_tagged_i32 => i32,
        bind_tagged_i64 => i64,
        bind_tagged_isize => isize,
        bind_tagged_u8 => u8,
        bind_tagged_u16 => u16,
        bind_tagged_u32 => u32,
        bind_tagged_u64 => u64,
        bind_tagged_usize => usize,
        bind_tagged_f32 => f32,
        bind_tagged_f64 => f64,
        bind_tagged_string => String,
    }

    /// Starts an override of `source`; see [`Override`].
    pub fn override_with(source: &Module) -> Override<'_> {
        Override::of(source)
    }

    /// Applies a reusable declaration unit to this module.
    pub fn configure<C: Configure>(&mut self, unit: C) -> &mut Self {
        unit.configure(self);
        self
    }

    /// A new module holding only the declarations of `unit`.
    pub fn from_config<C: Configure>(unit: C) -> Self {
        let mut module = Self::new();
        module.configure(unit);
        module
    }

    /// Declared keys in declaration order, duplicates included.
    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.bindings.iter().map(|(key, _)| key)
    }

    /// Whether `key` has at least one declaration.
    pub fn declares(&self, key: &Key) -> bool {
        self.bindings.iter().any(|(k, _)| k == key)
    }

    /// Variant of the first declaration for `key`.
    pub fn binding_kind(&self, key: &Key) -> Option<BindingKind> {
        self.bindings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, binding)| binding.kind())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Declaration errors recorded so far.
    pub fn errors(&self) -> &[BindingError] {
        &self.errors
    }

    /// Keys resolved when the module is installed.
    pub fn eager_keys(&self) -> &[Key] {
        &self.eager
    }

    pub(crate) fn push(&mut self, key: Key, binding: Binding) {
        self.bindings.push((key, binding));
    }

    pub(crate) fn reject(&mut self, err: BindingError) {
        tracing::trace!(error = %err, "declaration rejected");
        self.errors.push(err);
    }
}
