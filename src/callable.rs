//! Injectable functions and tagged parameter records.
//!
//! [`Callable`] is implemented for every `Fn(A1, .., An) -> O` (n <= 8) whose
//! parameters are [`Slot`]s, which lets the injector resolve one key per
//! parameter, left to right, and invoke the function. [`TaggedParams`] is the
//! record form used by tagged constructors, `call_tagged` and `populate`;
//! records are declared with [`tagged_params!`](crate::tagged_params).

use std::sync::Arc;

use crate::describe::{AnyArc, Describe, Slot, TypeDescriptor};
use crate::key::Key;

/// A function whose parameters can be resolved from an injector.
pub trait Callable<Args> {
    type Output;

    /// Descriptors of the parameters' target types, in order.
    fn inputs() -> Vec<TypeDescriptor>;

    /// Invokes the function with one erased value per parameter.
    ///
    /// Returns `None` if a value cannot be viewed as its parameter's type.
    fn invoke(&self, args: Vec<AnyArc>) -> Option<Self::Output>;

    /// Untagged keys of the parameters, in order.
    fn input_keys() -> Vec<Key> {
        Self::inputs()
            .iter()
            .map(|ty| Key::from_descriptor(ty, None))
            .collect()
    }
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg),*> Callable<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out,
            $($arg: Slot,)*
        {
            type Output = Out;

            fn inputs() -> Vec<TypeDescriptor> {
                vec![$(<<$arg as Slot>::Target as Describe>::descriptor()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: Vec<AnyArc>) -> Option<Out> {
                let mut args = args.into_iter();
                $(let $arg = <$arg as Slot>::fill(args.next()?)?;)*
                Some((self)($($arg),*))
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);
impl_callable!(A1, A2, A3, A4, A5, A6, A7);
impl_callable!(A1, A2, A3, A4, A5, A6, A7, A8);

/// One field of a tagged parameter record.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    ty: TypeDescriptor,
    tag: Option<&'static str>,
}

impl FieldSpec {
    pub fn new<T: ?Sized + Describe>(name: &'static str, tag: Option<&'static str>) -> Self {
        Self {
            name,
            ty: T::descriptor(),
            tag,
        }
    }

    /// Builds a field from an explicit descriptor.
    pub fn from_descriptor(
        name: &'static str,
        ty: TypeDescriptor,
        tag: Option<&'static str>,
    ) -> Self {
        Self { name, ty, tag }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    /// The key resolved to fill this field.
    pub fn key(&self) -> Key {
        Key::from_descriptor(&self.ty, self.tag.map(Arc::from))
    }
}

/// A record whose fields are resolved by (optionally tagged) key.
///
/// Implement with [`tagged_params!`](crate::tagged_params).
pub trait TaggedParams: Sized + Send + 'static {
    /// Field specifications in declaration order.
    fn fields() -> Vec<FieldSpec>;

    /// Builds the record from one value per field, in declaration order.
    fn from_values(values: Vec<AnyArc>) -> Option<Self>;

    /// Assigns the field at `index`; `false` if the value does not fit.
    fn assign(&mut self, index: usize, value: AnyArc) -> bool;
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_tag {
    () => {
        ::std::option::Option::None
    };
    ($tag:literal) => {
        ::std::option::Option::Some($tag)
    };
}

/// Declares a struct and implements [`TaggedParams`] for it.
///
/// Fields are `Arc<T>` or `Option<Arc<T>>`; a `#[tag = "..."]` attribute
/// resolves the field under that tag.
///
/// ```rust
/// use ferrous_inject::{tagged_params, TaggedParams};
/// use std::sync::Arc;
///
/// pub struct Pool;
/// ferrous_inject::injectable!(Pool);
///
/// tagged_params! {
///     pub struct RepoParams {
///         #[tag = "primary"]
///         pub pool: Arc<Pool>,
///         pub replica: Option<Arc<Pool>>,
///     }
/// }
///
/// let fields = RepoParams::fields();
/// assert_eq!(fields[0].tag(), Some("primary"));
/// assert_eq!(fields[1].name(), "replica");
/// ```
#[macro_export]
macro_rules! tagged_params {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[tag = $tag:literal])?
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $fty,)*
        }

        impl $crate::TaggedParams for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldSpec> {
                ::std::vec![
                    $(
                        $crate::FieldSpec::new::<<$fty as $crate::Slot>::Target>(
                            ::std::stringify!($field),
                            $crate::__field_tag!($($tag)?),
                        )
                    ),*
                ]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_values(values: ::std::vec::Vec<$crate::AnyArc>) -> ::std::option::Option<Self> {
                let mut values = values.into_iter();
                ::std::option::Option::Some(Self {
                    $($field: <$fty as $crate::Slot>::fill(values.next()?)?,)*
                })
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn assign(&mut self, index: usize, value: $crate::AnyArc) -> bool {
                let mut position = 0usize;
                $(
                    if position == index {
                        return match <$fty as $crate::Slot>::fill(value) {
                            ::std::option::Option::Some(filled) => {
                                self.$field = filled;
                                true
                            }
                            ::std::option::Option::None => false,
                        };
                    }
                    position += 1;
                )*
                false
            }
        }
    };
}
