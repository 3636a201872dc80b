//! The injector: a validated, immutable object graph.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::binding::{ConstructorBinding, ResolvedBinding};
use crate::config::InjectorOptions;
use crate::describe::AnyArc;
use crate::descriptors::BindingDescriptor;
use crate::error::{BindingError, ErrorKind, InjectResult};
use crate::internal::circular::StackGuard;
use crate::key::Key;
use crate::module::Module;
use crate::traits::ResolverCore;

mod install;

use install::Graph;

#[cfg(feature = "ahash")]
type MapHasher = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
type MapHasher = std::collections::hash_map::RandomState;

pub(crate) type BindingMap = HashMap<Key, ResolvedBinding, MapHasher>;

/// A validated object graph built from one or more [`Module`]s.
///
/// Construction installs every module in order and checks the whole graph:
/// declaration errors, duplicate keys, dangling aliases, unbound constructor
/// inputs and (by default) cycles. A graph that builds never reports
/// `NoBinding` for a key reachable from its own declarations.
///
/// Cloning is cheap and shares the graph, including memoized values.
/// Queries live on the [`Resolver`](crate::Resolver) trait.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{injectable, Injector, Module, Resolver};
/// use std::sync::Arc;
///
/// pub struct Config {
///     pub url: String,
/// }
/// injectable!(Config);
///
/// pub struct Client {
///     pub config: Arc<Config>,
/// }
/// injectable!(Client);
///
/// let mut module = Module::new();
/// module.bind::<Config>().to_singleton(Config { url: "http://localhost".into() });
/// module
///     .bind::<Client>()
///     .to_singleton_constructor(|config: Arc<Config>| Ok::<_, std::io::Error>(Client { config }));
///
/// let injector = Injector::new([module]).unwrap();
/// let client = injector.get::<Client>().unwrap();
/// assert_eq!(client.config.url, "http://localhost");
/// assert!(Arc::ptr_eq(&client, &injector.get::<Client>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

struct InjectorInner {
    parent: Option<Injector>,
    bindings: BindingMap,
    order: Vec<Key>,
    options: InjectorOptions,
}

impl Injector {
    /// Builds an injector from `modules` with default options.
    pub fn new<I>(modules: I) -> InjectResult<Self>
    where
        I: IntoIterator<Item = Module>,
    {
        Self::build(None, InjectorOptions::default(), modules)
    }

    pub fn with_options<I>(options: InjectorOptions, modules: I) -> InjectResult<Self>
    where
        I: IntoIterator<Item = Module>,
    {
        Self::build(None, options, modules)
    }

    /// Builds an injector layered over this one.
    ///
    /// The child sees every key of its ancestors and may add new ones, but
    /// redeclaring an ancestor's key fails with `AlreadyBound`. The parent is
    /// shared, not copied: its memoized values are the child's too.
    pub fn child<I>(&self, modules: I) -> InjectResult<Self>
    where
        I: IntoIterator<Item = Module>,
    {
        Self::build(Some(self.clone()), self.inner.options, modules)
    }

    /// Like [`child`](Self::child), with its own options.
    pub fn child_with_options<I>(&self, options: InjectorOptions, modules: I) -> InjectResult<Self>
    where
        I: IntoIterator<Item = Module>,
    {
        Self::build(Some(self.clone()), options, modules)
    }

    fn build<I>(
        parent: Option<Injector>,
        options: InjectorOptions,
        modules: I,
    ) -> InjectResult<Self>
    where
        I: IntoIterator<Item = Module>,
    {
        let graph = match Self::assemble(parent.as_ref(), options, modules) {
            Ok(graph) => graph,
            Err(err) => {
                tracing::warn!(error = %err, "injector construction failed");
                return Err(err.into());
            }
        };

        let Graph {
            bindings,
            order,
            eager,
            ..
        } = graph;
        tracing::debug!(
            bindings = order.len(),
            eager = eager.len(),
            child = parent.is_some(),
            "injector built"
        );

        let injector = Injector {
            inner: Arc::new(InjectorInner {
                parent,
                bindings,
                order,
                options,
            }),
        };

        if options.resolve_eager {
            for key in &eager {
                if let Err(err) = injector.resolve_any(key) {
                    tracing::warn!(key = %key, error = %err, "eager resolution failed");
                    return Err(err);
                }
            }
        }
        Ok(injector)
    }

    fn assemble<I>(
        parent: Option<&Injector>,
        options: InjectorOptions,
        modules: I,
    ) -> Result<Graph, BindingError>
    where
        I: IntoIterator<Item = Module>,
    {
        let mut graph = Graph::new();
        for (index, module) in modules.into_iter().enumerate() {
            graph.install(index, module, parent)?;
        }
        graph.validate_inputs(parent)?;
        if options.detect_cycles {
            graph.detect_cycles()?;
        }
        Ok(graph)
    }

    /// Whether `key` is bound here or in an ancestor.
    pub fn contains(&self, key: &Key) -> bool {
        self.inner.bindings.contains_key(key)
            || self.inner.parent.as_ref().map_or(false, |p| p.contains(key))
    }

    /// Descriptors of this injector's own bindings, in install order.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        self.inner
            .order
            .iter()
            .filter_map(|key| {
                self.inner.bindings.get(key).map(|binding| BindingDescriptor {
                    key: key.clone(),
                    kind: binding.kind(),
                    dependencies: binding.dependencies().to_vec(),
                })
            })
            .collect()
    }

    pub fn parent(&self) -> Option<&Injector> {
        self.inner.parent.as_ref()
    }

    pub fn options(&self) -> InjectorOptions {
        self.inner.options
    }

    /// Number of keys bound by this injector itself.
    pub fn len(&self) -> usize {
        self.inner.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.order.is_empty()
    }

    fn owner_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    fn resolve_binding(&self, key: &Key, binding: &ResolvedBinding) -> InjectResult<AnyArc> {
        tracing::trace!(key = %key, kind = %binding.kind(), "resolving");
        match binding {
            ResolvedBinding::Alias { target, coercion } => {
                let value = self.resolve_any(target)?;
                coercion.apply(value).ok_or_else(|| {
                    BindingError::new(ErrorKind::TypeUnavailable)
                        .key(key)
                        .tag("target", target)
                        .into()
                })
            }
            ResolvedBinding::Fixed(value) => Ok(Arc::clone(value)),
            ResolvedBinding::Constructor(constructor) => self.construct(constructor),
            ResolvedBinding::Memoized {
                group,
                coercion,
                cell,
            } => {
                // Keys of one group share the cell: entering it twice on
                // this thread would block on our own initialisation.
                let cell_owner = Arc::as_ptr(cell) as *const () as usize;
                let _guard = StackGuard::enter(cell_owner, &group.anchor)?;
                let value = cell.get_or_init(|| self.construct(&group.constructor)).clone()?;
                coercion.apply(value).ok_or_else(|| {
                    BindingError::new(ErrorKind::TypeUnavailable)
                        .key(key)
                        .tag("constructor", &group.anchor)
                        .into()
                })
            }
        }
    }

    /// Resolves the inputs left to right, stopping at the first failure.
    fn construct(&self, constructor: &ConstructorBinding) -> InjectResult<AnyArc> {
        let args = self.resolve_all(&constructor.inputs)?;
        (constructor.producer)(args)
    }

    pub(crate) fn resolve_all(&self, keys: &[Key]) -> InjectResult<Vec<AnyArc>> {
        keys.iter().map(|key| self.resolve_any(key)).collect()
    }
}

impl ResolverCore for Injector {
    fn resolve_any(&self, key: &Key) -> InjectResult<AnyArc> {
        match self.inner.bindings.get(key) {
            Some(binding) => {
                let _guard = StackGuard::enter(self.owner_id(), key)?;
                self.resolve_binding(key, binding)
            }
            None => match &self.inner.parent {
                Some(parent) => parent.resolve_any(key),
                None => Err(BindingError::new(ErrorKind::NoBinding).key(key).into()),
            },
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("bindings", &self.inner.order)
            .field("options", &self.inner.options)
            .field("parent", &self.inner.parent)
            .finish()
    }
}
