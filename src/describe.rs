//! Type descriptors: the runtime shape information the verifier works on.
//!
//! Rust has no runtime reflection, so every type that can take part in a
//! binding describes itself through [`Describe`]. A descriptor carries the
//! type's identity, its [`TypeShape`] and, for structs, the explicit set of
//! interfaces it implements together with the upcast that turns the erased
//! concrete value into the erased interface value.
//!
//! Interfaces are declared with [`interface!`](crate::interface) and structs
//! with [`injectable!`](crate::injectable). Primitives, `Arc<T>`, `Vec<T>` and
//! `Option<T>` are described by the crate.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-erased shared value as stored in the graph.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Conversion of an erased concrete value into an erased interface value.
pub type UpcastFn = Arc<dyn Fn(AnyArc) -> Option<AnyArc> + Send + Sync>;

/// Closed set of type shapes the verifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// A trait object, `dyn Trait`
    Interface,
    /// A concrete struct or enum
    Struct,
    /// `Arc<T>` of a struct `T`
    StructRef,
    /// `bool`, integers, floats, `char` and `String`
    Primitive,
    /// Anything else
    Unsupported,
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeShape::Interface => "interface",
            TypeShape::Struct => "struct",
            TypeShape::StructRef => "struct-ref",
            TypeShape::Primitive => "primitive",
            TypeShape::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// One interface a type implements, with the conversion into it.
#[derive(Clone)]
pub struct Capability {
    interface: TypeId,
    interface_name: &'static str,
    upcast: UpcastFn,
}

impl Capability {
    pub fn interface(&self) -> TypeId {
        self.interface
    }

    pub fn interface_name(&self) -> &'static str {
        self.interface_name
    }

    pub(crate) fn upcast(&self) -> &UpcastFn {
        &self.upcast
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.interface_name).finish()
    }
}

/// Identity, shape and capability set of one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    shape: TypeShape,
    capabilities: Vec<Capability>,
}

impl TypeDescriptor {
    /// Descriptor of `T` with the given shape and no capabilities.
    pub fn of<T: ?Sized + 'static>(shape: TypeShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape,
            capabilities: Vec::new(),
        }
    }

    pub fn interface<T: ?Sized + 'static>() -> Self {
        Self::of::<T>(TypeShape::Interface)
    }

    pub fn structure<T: 'static>() -> Self {
        Self::of::<T>(TypeShape::Struct)
    }

    pub fn primitive<T: 'static>() -> Self {
        Self::of::<T>(TypeShape::Primitive)
    }

    pub fn unsupported<T: ?Sized + 'static>() -> Self {
        Self::of::<T>(TypeShape::Unsupported)
    }

    /// Records that `C` implements the interface `I`.
    ///
    /// `cast` is the unsizing conversion, normally `|this| this as Arc<dyn I>`.
    pub fn implements<C, I>(mut self, cast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        C: Describe,
        I: ?Sized + Describe,
    {
        let upcast: UpcastFn = Arc::new(move |any: AnyArc| {
            let concrete = C::from_any(any)?;
            Some(I::into_any(cast(concrete)))
        });
        self.capabilities.push(Capability {
            interface: TypeId::of::<I>(),
            interface_name: std::any::type_name::<I>(),
            upcast,
        });
        self
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> TypeShape {
        self.shape
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// The capability for the interface with the given id, if declared.
    pub fn capability_for(&self, interface: TypeId) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.interface == interface)
    }

    pub fn implements_interface(&self, interface: TypeId) -> bool {
        self.capability_for(interface).is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// A type that can appear in a binding key.
///
/// Implementations convert between `Arc<Self>` and the erased storage form:
/// structs and primitives are stored as `Arc<T>`, interfaces as
/// `Arc<Arc<dyn Trait>>`.
pub trait Describe: Send + Sync + 'static {
    fn descriptor() -> TypeDescriptor;

    fn into_any(this: Arc<Self>) -> AnyArc;

    fn from_any(any: AnyArc) -> Option<Arc<Self>>;
}

/// A parameter or record field the injector knows how to fill.
///
/// `Arc<T>` requires a binding for `T`; `Option<Arc<T>>` is the same key,
/// starting out as `None` in records passed to `populate`.
pub trait Slot: Sized + Send + 'static {
    /// The type whose key is resolved to fill the slot.
    type Target: ?Sized + Describe;

    fn fill(any: AnyArc) -> Option<Self>;
}

impl<T: ?Sized + Describe> Slot for Arc<T> {
    type Target = T;

    fn fill(any: AnyArc) -> Option<Self> {
        T::from_any(any)
    }
}

impl<T: ?Sized + Describe> Slot for Option<Arc<T>> {
    type Target = T;

    fn fill(any: AnyArc) -> Option<Self> {
        T::from_any(any).map(Some)
    }
}

impl<T: Describe> Describe for Arc<T> {
    fn descriptor() -> TypeDescriptor {
        let inner = T::descriptor();
        let shape = match inner.shape {
            TypeShape::Struct => TypeShape::StructRef,
            _ => TypeShape::Unsupported,
        };
        let capabilities = inner
            .capabilities
            .into_iter()
            .map(|cap| {
                let upcast = cap.upcast.clone();
                Capability {
                    upcast: Arc::new(move |any: AnyArc| {
                        let outer = any.downcast::<Arc<T>>().ok()?;
                        upcast(T::into_any((*outer).clone()))
                    }),
                    ..cap
                }
            })
            .collect();

        TypeDescriptor {
            id: TypeId::of::<Arc<T>>(),
            name: std::any::type_name::<Arc<T>>(),
            shape,
            capabilities,
        }
    }

    fn into_any(this: Arc<Self>) -> AnyArc {
        this
    }

    fn from_any(any: AnyArc) -> Option<Arc<Self>> {
        any.downcast::<Arc<T>>().ok()
    }
}

macro_rules! describe_as {
    ($ctor:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::$ctor::<$ty>()
                }

                fn into_any(this: Arc<Self>) -> AnyArc {
                    this
                }

                fn from_any(any: AnyArc) -> Option<Arc<Self>> {
                    any.downcast::<$ty>().ok()
                }
            }
        )+
    };
}

describe_as!(primitive =>
    bool, char, String,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
);

impl<T: Send + Sync + 'static> Describe for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::unsupported::<Vec<T>>()
    }

    fn into_any(this: Arc<Self>) -> AnyArc {
        this
    }

    fn from_any(any: AnyArc) -> Option<Arc<Self>> {
        any.downcast::<Vec<T>>().ok()
    }
}

impl<T: Send + Sync + 'static> Describe for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::unsupported::<Option<T>>()
    }

    fn into_any(this: Arc<Self>) -> AnyArc {
        this
    }

    fn from_any(any: AnyArc) -> Option<Arc<Self>> {
        any.downcast::<Option<T>>().ok()
    }
}

/// Declares trait objects as injectable interfaces.
///
/// The trait must have `Send + Sync` as supertraits.
///
/// ```rust
/// use ferrous_inject::{interface, Describe, TypeShape};
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// interface!(dyn Clock);
///
/// assert_eq!(<dyn Clock as Describe>::descriptor().shape(), TypeShape::Interface);
/// ```
#[macro_export]
macro_rules! interface {
    ($(dyn $iface:path),+ $(,)?) => {
        $(
            impl $crate::Describe for dyn $iface {
                fn descriptor() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::interface::<dyn $iface>()
                }

                fn into_any(this: ::std::sync::Arc<Self>) -> $crate::AnyArc {
                    ::std::sync::Arc::new(this)
                }

                fn from_any(any: $crate::AnyArc) -> ::std::option::Option<::std::sync::Arc<Self>> {
                    any.downcast::<::std::sync::Arc<dyn $iface>>()
                        .ok()
                        .map(|outer| (*outer).clone())
                }
            }
        )+
    };
}

/// Declares a struct as injectable, with the interfaces it implements.
///
/// ```rust
/// use ferrous_inject::{interface, injectable, Describe};
/// use std::any::TypeId;
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// interface!(dyn Clock);
///
/// pub struct FixedClock(u64);
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { self.0 }
/// }
/// injectable!(FixedClock: dyn Clock);
///
/// let descriptor = FixedClock::descriptor();
/// assert!(descriptor.implements_interface(TypeId::of::<dyn Clock>()));
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty : $(dyn $iface:path),* $(,)?) => {
        impl $crate::Describe for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::structure::<$ty>()
                    $(
                        .implements::<$ty, dyn $iface>(|this| this as ::std::sync::Arc<dyn $iface>)
                    )*
            }

            fn into_any(this: ::std::sync::Arc<Self>) -> $crate::AnyArc {
                this
            }

            fn from_any(any: $crate::AnyArc) -> ::std::option::Option<::std::sync::Arc<Self>> {
                any.downcast::<$ty>().ok()
            }
        }
    };
    ($ty:ty) => {
        $crate::injectable!($ty :);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }
    crate::interface!(dyn Greeter);

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }
    crate::injectable!(English: dyn Greeter);

    struct Plain;
    crate::injectable!(Plain);

    #[test]
    fn test_struct_upcasts_to_declared_interface() {
        let descriptor = English::descriptor();
        assert_eq!(descriptor.shape(), TypeShape::Struct);

        let cap = descriptor
            .capability_for(TypeId::of::<dyn Greeter>())
            .expect("capability declared");
        let erased = English::into_any(Arc::new(English));
        let upcast = (cap.upcast())(erased).expect("upcast succeeds");
        let greeter = <dyn Greeter>::from_any(upcast).expect("stored as interface");
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_struct_ref_keeps_capabilities() {
        let descriptor = <Arc<English>>::descriptor();
        assert_eq!(descriptor.shape(), TypeShape::StructRef);

        let cap = descriptor
            .capability_for(TypeId::of::<dyn Greeter>())
            .expect("capability carried over");
        let erased = <Arc<English>>::into_any(Arc::new(Arc::new(English)));
        let greeter = <dyn Greeter>::from_any((cap.upcast())(erased).unwrap()).unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_shapes_of_builtin_types() {
        assert_eq!(u16::descriptor().shape(), TypeShape::Primitive);
        assert_eq!(String::descriptor().shape(), TypeShape::Primitive);
        assert_eq!(<Vec<u8>>::descriptor().shape(), TypeShape::Unsupported);
        assert_eq!(<Option<Plain>>::descriptor().shape(), TypeShape::Unsupported);
        assert_eq!(<Arc<u16>>::descriptor().shape(), TypeShape::Unsupported);
        assert!(Plain::descriptor().capabilities().is_empty());
    }

    #[test]
    fn test_upcast_rejects_foreign_values() {
        let cap = English::descriptor().capabilities()[0].clone();
        let foreign: AnyArc = Arc::new(Plain);
        assert!((cap.upcast())(foreign).is_none());
    }
}
