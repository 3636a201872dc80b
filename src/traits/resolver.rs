//! Resolver traits: the query surface of an injector.

use std::sync::Arc;

use crate::callable::{Callable, TaggedParams};
use crate::describe::{AnyArc, Describe};
use crate::error::{BindingError, ErrorKind, InjectResult};
use crate::key::Key;
use crate::verify;

/// Object-safe resolution by key.
///
/// Returns the erased value stored for `key`: `Arc<T>` for structs and
/// primitives, `Arc<Arc<dyn Trait>>` for interfaces. Most callers want the
/// typed methods of [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    fn resolve_any(&self, key: &Key) -> InjectResult<AnyArc>;
}

macro_rules! tagged_constants {
    ($($method:ident => $ty:ty),+ $(,)?) => {
        $(
            #[doc = concat!("Value of the `", stringify!($ty), "` bound under `tag`.")]
            ///
            /// # Panics
            ///
            /// If the binding holds a value of another type.
            fn $method(&self, tag: &str) -> InjectResult<$ty> {
                self.get_constant::<$ty>(tag)
            }
        )+
    };
}

/// Typed queries over a [`ResolverCore`].
///
/// # Examples
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
///     fn now(&self) -> u64 { 42 }
/// }
/// injectable!(Fixed: dyn Clock);
///
/// let mut module = Module::new();
/// module.bind::<dyn Clock>().to_singleton(Fixed);
/// module.bind_tagged_string("zone").to_singleton("UTC".to_string());
///
/// let injector = Injector::new([module]).unwrap();
/// assert_eq!(injector.get::<dyn Clock>().unwrap().now(), 42);
/// assert_eq!(injector.get_tagged_string("zone").unwrap(), "UTC");
///
/// let now = injector.call(|clock: Arc<dyn Clock>| clock.now()).unwrap();
/// assert_eq!(now, 42);
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the untagged key of `T`.
    fn get<T: ?Sized + Describe>(&self) -> InjectResult<Arc<T>> {
        self.get_key(&Key::of::<T>())
    }

    /// Resolves the key of `T` under `tag`.
    fn get_tagged<T: ?Sized + Describe>(&self, tag: &str) -> InjectResult<Arc<T>> {
        self.get_key(&tagged_key::<T>(tag)?)
    }

    /// Resolves `key` and views the value as `T`.
    ///
    /// Fails with `TypeUnavailable` if `key` is not a key of `T`.
    fn get_key<T: ?Sized + Describe>(&self, key: &Key) -> InjectResult<Arc<T>> {
        let value = self.resolve_any(key)?;
        T::from_any(value).ok_or_else(|| {
            BindingError::new(ErrorKind::TypeUnavailable)
                .key(key)
                .tag("type", std::any::type_name::<T>())
                .into()
        })
    }

    /// Resolves one key per parameter, left to right, and invokes `f`.
    fn call<F, Args>(&self, f: F) -> InjectResult<F::Output>
    where
        F: Callable<Args>,
    {
        let mut args = Vec::new();
        for key in F::input_keys() {
            args.push(self.resolve_any(&key)?);
        }
        f.invoke(args).ok_or_else(|| {
            BindingError::new(ErrorKind::TypeUnavailable)
                .tag("function", std::any::type_name::<F>())
                .into()
        })
    }

    /// Resolves every field of `P` by its (tagged) key and invokes `f`.
    fn call_tagged<F, P, O>(&self, f: F) -> InjectResult<O>
    where
        F: FnOnce(P) -> O,
        P: TaggedParams,
    {
        let mut values = Vec::new();
        for field in P::fields() {
            verify::verify_record_field(&field)?;
            values.push(self.resolve_any(&field.key())?);
        }
        let params = P::from_values(values).ok_or_else(|| {
            BindingError::new(ErrorKind::TypeUnavailable).tag("params", std::any::type_name::<P>())
        })?;
        Ok(f(params))
    }

    /// Assigns every field of `target` from its (tagged) key.
    ///
    /// Stops at the first field that fails; fields assigned before it keep
    /// their new values.
    fn populate<P: TaggedParams>(&self, target: &mut P) -> InjectResult<()> {
        for (index, field) in P::fields().iter().enumerate() {
            verify::verify_record_field(field)?;
            let key = field.key();
            let value = self.resolve_any(&key)?;
            if !target.assign(index, value) {
                return Err(BindingError::new(ErrorKind::TypeUnavailable)
                    .key(&key)
                    .tag("field", field.name())
                    .into());
            }
        }
        Ok(())
    }

    /// Resolves a tagged primitive and clones it out.
    ///
    /// # Panics
    ///
    /// If the binding holds a value of another type.
    fn get_constant<T: Describe + Clone>(&self, tag: &str) -> InjectResult<T> {
        let key = tagged_key::<T>(tag)?;
        let value = self.resolve_any(&key)?;
        match value.downcast::<T>() {
            Ok(value) => Ok(T::clone(&value)),
            Err(_) => panic!(
                "inject: binding for {} does not hold a {}",
                key,
                std::any::type_name::<T>()
            ),
        }
    }

    tagged_constants! {
        get_tagged_bool => bool,
        get_tagged_char => char,
        get_tagged_i8 => i8,
        get_tagged_i16 => i16,
        get_tagged_i32 => i32,
        get_tagged_i64 => i64,
        get_tagged_isize => isize,
        get_tagged_u8 => u8,
        get_tagged_u16 => u16,
        get_tagged_u32 => u32,
        get_tagged_u64 => u64,
        get_tagged_usize => usize,
        get_tagged_f32 => f32,
        get_tagged_f64 => f64,
        get_tagged_string => String,
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn tagged_key<T: ?Sized + 'static>(tag: &str) -> Result<Key, BindingError> {
    if tag.is_empty() {
        return Err(BindingError::new(ErrorKind::TagEmpty).tag("type", std::any::type_name::<T>()));
    }
    Ok(Key::tagged::<T>(tag))
}
