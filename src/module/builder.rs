//! The declaration surface bound to one or more keys of a module.

use std::error::Error;
use std::sync::Arc;

use crate::binding::{Binding, ConstructorBinding, MemoGroup, Producer};
use crate::callable::{Callable, TaggedParams};
use crate::describe::{AnyArc, Describe, TypeDescriptor};
use crate::error::{BindingError, ErrorKind, InjectError, InjectResult};
use crate::key::Key;
use crate::module::Module;
use crate::verify::{self, Candidate, Coercion, Inputs, Signature};

/// Fluent declaration of how the builder's keys are fulfilled.
///
/// Every finalizer verifies the candidate against each key and installs one
/// binding per key that passes. Failures are recorded in the module; nothing
/// is returned to the caller.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{interface, injectable, Injector, Module, Resolver};
/// use std::sync::Arc;
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// interface!(dyn Greeter);
///
/// pub struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// injectable!(English: dyn Greeter);
///
/// let mut module = Module::new();
/// module.bind::<English>().to_singleton(English);
/// module.bind::<dyn Greeter>().and_tagged::<dyn Greeter>("default").to::<English>();
///
/// let injector = Injector::new([module]).unwrap();
/// assert_eq!(injector.get::<dyn Greeter>().unwrap().greet(), "hello");
/// assert_eq!(injector.get_tagged::<dyn Greeter>("default").unwrap().greet(), "hello");
/// ```
#[must_use = "a builder declares nothing until one of its `to*` methods is called"]
pub struct Builder<'m> {
    module: &'m mut Module,
    keys: Vec<(Key, TypeDescriptor)>,
    rejected: usize,
    eager: bool,
}

impl<'m> Builder<'m> {
    pub(crate) fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            keys: Vec::new(),
            rejected: 0,
            eager: false,
        }
    }

    /// Adds the untagged key of `T`.
    pub fn and<T: ?Sized + Describe>(self) -> Self {
        self.with_key(T::descriptor(), None)
    }

    /// Adds the key of `T` under `tag`.
    pub fn and_tagged<T: ?Sized + Describe>(self, tag: impl Into<Arc<str>>) -> Self {
        self.with_key(T::descriptor(), Some(tag.into()))
    }

    /// Resolves the builder's keys when the module is installed.
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    fn with_key(mut self, ty: TypeDescriptor, tag: Option<Arc<str>>) -> Self {
        let key = Key::from_descriptor(&ty, tag.clone());
        if tag.as_deref() == Some("") {
            self.rejected += 1;
            self.module
                .reject(BindingError::new(ErrorKind::TagEmpty).tag("type", ty.name()));
            return self;
        }
        if let Err(err) = verify::verify_key(&ty, tag.is_some()) {
            self.rejected += 1;
            self.module.reject(err.key(&key));
            return self;
        }
        self.keys.push((key, ty));
        self
    }

    /// Binds the keys to whatever the untagged key of `T` resolves to.
    pub fn to<T: ?Sized + Describe>(self) -> &'m mut Module {
        let target_ty = T::descriptor();
        let target = Key::from_descriptor(&target_ty, None);
        self.install(|key| {
            let coercion = verify::verify_alias_target(key, &target_ty)?;
            Ok(Binding::Alias {
                target: target.clone(),
                coercion,
            })
        })
    }

    /// Binds the keys to one fixed value.
    ///
    /// The value must be sized. An existing `Arc<dyn Trait>` goes through
    /// [`to_shared`](Self::to_shared) instead.
    pub fn to_singleton<V: Describe>(self, value: V) -> &'m mut Module {
        self.to_shared(Arc::new(value))
    }

    /// Binds the keys to a value that is already shared.
    ///
    /// Unlike [`to_singleton`](Self::to_singleton), `V` may be an interface:
    /// an `Arc<dyn Trait>` can be bound to the key of `dyn Trait` itself.
    ///
    /// ```rust
    /// use ferrous_inject::{interface, injectable, Injector, Module, Resolver};
    /// use std::sync::Arc;
    ///
    /// pub trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    /// interface!(dyn Clock);
    ///
    /// pub struct Fixed;
    /// impl Clock for Fixed {
    ///     fn now(&self) -> u64 { 3 }
    /// }
    /// injectable!(Fixed: dyn Clock);
    ///
    /// let clock: Arc<dyn Clock> = Arc::new(Fixed);
    /// let mut module = Module::new();
    /// module.bind::<dyn Clock>().to_shared(Arc::clone(&clock));
    ///
    /// let injector = Injector::new([module]).unwrap();
    /// assert!(Arc::ptr_eq(&injector.get::<dyn Clock>().unwrap(), &clock));
    /// ```
    pub fn to_shared<V: ?Sized + Describe>(self, value: Arc<V>) -> &'m mut Module {
        let value_ty = V::descriptor();
        let erased = V::into_any(value);
        self.install(|key| {
            let coercion = verify::verify_value_assignable(key, &value_ty)?;
            coercion
                .apply(erased.clone())
                .map(Binding::Fixed)
                .ok_or_else(|| type_unavailable(key, &value_ty))
        })
    }

    /// Binds the keys to a constructor invoked on every resolution.
    ///
    /// Each parameter is resolved by the untagged key of its target type. The
    /// constructor returns a concrete `R`; interface keys receive it through
    /// the capabilities `R` declares.
    pub fn to_constructor<F, Args, R, E>(self, constructor: F) -> &'m mut Module
    where
        F: Callable<Args, Output = Result<R, E>> + Send + Sync + 'static,
        Args: 'static,
        R: Describe,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.constructor(constructor, false)
    }

    /// Like [`to_constructor`](Self::to_constructor), but the constructor runs
    /// at most once per injector and its result is shared.
    pub fn to_singleton_constructor<F, Args, R, E>(self, constructor: F) -> &'m mut Module
    where
        F: Callable<Args, Output = Result<R, E>> + Send + Sync + 'static,
        Args: 'static,
        R: Describe,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.constructor(constructor, true)
    }

    /// Binds the keys to a constructor taking one tagged parameter record.
    pub fn to_tagged_constructor<F, P, R, E>(self, constructor: F) -> &'m mut Module
    where
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
        P: TaggedParams,
        R: Describe,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.tagged_constructor(constructor, false)
    }

    /// Memoized form of [`to_tagged_constructor`](Self::to_tagged_constructor).
    pub fn to_tagged_singleton_constructor<F, P, R, E>(self, constructor: F) -> &'m mut Module
    where
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
        P: TaggedParams,
        R: Describe,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        self.tagged_constructor(constructor, true)
    }

    fn constructor<F, Args, R, E>(self, constructor: F, memoized: bool) -> &'m mut Module
    where
        F: Callable<Args, Output = Result<R, E>> + Send + Sync + 'static,
        Args: 'static,
        R: Describe,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        let output = R::descriptor();
        let candidate = Candidate::Function(Signature::fallible(
            Inputs::Positional(<F as Callable<Args>>::inputs()),
            output.clone(),
        ));
        let inputs = <F as Callable<Args>>::input_keys();
        let name = output.name();
        let produce: Producer = Arc::new(move |args: Vec<AnyArc>| -> InjectResult<AnyArc> {
            let produced = <F as Callable<Args>>::invoke(&constructor, args)
                .ok_or_else(|| mismatched_arguments(name))?;
            erase::<R, E>(produced)
        });

        self.install_constructor(inputs, output, produce, memoized, |key| {
            verify::verify_constructor_shape(key, &candidate)
        })
    }

    fn tagged_constructor<F, P, R, E>(self, constructor: F, memoized: bool) -> &'m mut Module
    where
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
        P: TaggedParams,
        R: Describe,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        let output = R::descriptor();
        let fields = P::fields();
        let inputs: Vec<Key> = fields.iter().map(|field| field.key()).collect();
        let candidate =
            Candidate::Function(Signature::fallible(Inputs::Record(fields), output.clone()));
        let name = output.name();
        let produce: Producer = Arc::new(move |args: Vec<AnyArc>| -> InjectResult<AnyArc> {
            let params = P::from_values(args).ok_or_else(|| mismatched_arguments(name))?;
            erase::<R, E>(constructor(params))
        });

        self.install_constructor(inputs, output, produce, memoized, |key| {
            verify::verify_tagged_constructor_shape(key, &candidate)
        })
    }

    /// Installs `produce` against every key that passes `verify_one`.
    ///
    /// Memoized keys share one group, so the constructor runs once for all of
    /// them; plain constructors coerce inside their own producer.
    fn install_constructor<V>(
        self,
        inputs: Vec<Key>,
        output: TypeDescriptor,
        produce: Producer,
        memoized: bool,
        verify_one: V,
    ) -> &'m mut Module
    where
        V: Fn(&TypeDescriptor) -> Result<Coercion, BindingError>,
    {
        let group = memoized.then(|| {
            let anchor = self
                .keys
                .first()
                .map(|(key, _)| key.clone())
                .unwrap_or_else(|| Key::from_descriptor(&output, None));
            Arc::new(MemoGroup::new(
                anchor,
                ConstructorBinding::new(inputs.clone(), Arc::clone(&produce)),
            ))
        });

        self.install(|key| {
            let coercion = verify_one(key)?;
            if let Some(group) = &group {
                return Ok(Binding::Memoized {
                    group: Arc::clone(group),
                    coercion,
                });
            }
            let produce = Arc::clone(&produce);
            let key_ty = key.clone();
            let output = output.clone();
            let producer: Producer = Arc::new(move |args: Vec<AnyArc>| -> InjectResult<AnyArc> {
                let value = produce(args)?;
                coercion
                    .apply(value)
                    .ok_or_else(|| type_unavailable(&key_ty, &output).into())
            });
            Ok(Binding::Constructor(ConstructorBinding::new(inputs.clone(), producer)))
        })
    }

    /// Verifies and installs one binding per key.
    fn install<V>(self, mut verify_one: V) -> &'m mut Module
    where
        V: FnMut(&TypeDescriptor) -> Result<Binding, BindingError>,
    {
        let Builder {
            module,
            keys,
            rejected,
            eager,
        } = self;

        if keys.is_empty() && rejected == 0 {
            module.reject(BindingError::new(ErrorKind::Nil));
            return module;
        }

        for (key, ty) in keys {
            match verify_one(&ty) {
                Ok(binding) => {
                    tracing::trace!(key = %key, kind = %binding.kind(), "binding declared");
                    if eager {
                        module.eager.push(key.clone());
                    }
                    module.push(key, binding);
                }
                Err(err) => module.reject(err.key(&key)),
            }
        }
        module
    }
}

/// Erases a constructor's result, carrying its error unchanged.
fn erase<R, E>(produced: Result<R, E>) -> InjectResult<AnyArc>
where
    R: Describe,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    let value = produced.map_err(InjectError::from_producer)?;
    Ok(R::into_any(Arc::new(value)))
}

fn mismatched_arguments(constructor: &'static str) -> InjectError {
    BindingError::new(ErrorKind::TypeUnavailable)
        .tag("constructor", constructor)
        .into()
}

fn type_unavailable(key: &TypeDescriptor, candidate: &TypeDescriptor) -> BindingError {
    BindingError::new(ErrorKind::TypeUnavailable)
        .tag("type", candidate.name())
        .tag("expected", key.name())
}
