//! Declaration-time type verification.
//!
//! Pure functions over [`TypeDescriptor`]s and [`Candidate`]s. Each returns the
//! [`Coercion`] that turns a candidate's erased value into the key's erased
//! value, or the [`BindingError`] describing why the candidate is rejected.
//! Nothing here runs during resolution.

use std::fmt;

use crate::callable::FieldSpec;
use crate::describe::{AnyArc, TypeDescriptor, TypeShape, UpcastFn};
use crate::error::{BindingError, ErrorKind};

/// Conversion from a candidate's erased value to the key's erased value.
#[derive(Clone)]
pub enum Coercion {
    /// Candidate and key are the same type
    Identity,
    /// Candidate implements the key's interface
    Upcast(UpcastFn),
}

impl Coercion {
    /// Applies the conversion; `None` if the value is not the candidate type.
    pub fn apply(&self, value: AnyArc) -> Option<AnyArc> {
        match self {
            Coercion::Identity => Some(value),
            Coercion::Upcast(upcast) => upcast(value),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Coercion::Identity)
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coercion::Identity => f.write_str("Identity"),
            Coercion::Upcast(_) => f.write_str("Upcast"),
        }
    }
}

/// What a builder was handed: a value's type or a function's signature.
#[derive(Debug, Clone)]
pub enum Candidate {
    Value(TypeDescriptor),
    Function(Signature),
}

/// Parameter list and return slots of a function candidate.
#[derive(Debug, Clone)]
pub struct Signature {
    pub inputs: Inputs,
    pub returns: Vec<ReturnSlot>,
}

#[derive(Debug, Clone)]
pub enum Inputs {
    /// Ordinary positional parameters
    Positional(Vec<TypeDescriptor>),
    /// A single record parameter with named, optionally tagged fields
    Record(Vec<FieldSpec>),
}

#[derive(Debug, Clone)]
pub enum ReturnSlot {
    Value(TypeDescriptor),
    Error,
}

impl Signature {
    /// Signature of a fallible constructor: `inputs -> Result<output, _>`.
    pub fn fallible(inputs: Inputs, output: TypeDescriptor) -> Self {
        Self {
            inputs,
            returns: vec![ReturnSlot::Value(output), ReturnSlot::Error],
        }
    }
}

/// Checks that a key of this type may be bound at all.
///
/// Interfaces, structs and struct references are always bindable; primitives
/// only under a tag.
pub fn verify_key(key: &TypeDescriptor, tagged: bool) -> Result<(), BindingError> {
    match key.shape() {
        TypeShape::Interface | TypeShape::Struct | TypeShape::StructRef => Ok(()),
        TypeShape::Primitive if tagged => Ok(()),
        TypeShape::Primitive | TypeShape::Unsupported => Err(not_supported(key)),
    }
}

/// Checks that `candidate` may stand in for `key` through an alias.
pub fn verify_alias_target(
    key: &TypeDescriptor,
    candidate: &TypeDescriptor,
) -> Result<Coercion, BindingError> {
    match key.shape() {
        TypeShape::Interface => implements(key, candidate),
        TypeShape::Struct | TypeShape::StructRef => identical(key, candidate),
        TypeShape::Primitive | TypeShape::Unsupported => Err(not_supported(key)),
    }
}

/// Checks that a value of type `candidate` can be stored under `key`.
pub fn verify_value_assignable(
    key: &TypeDescriptor,
    candidate: &TypeDescriptor,
) -> Result<Coercion, BindingError> {
    match key.shape() {
        TypeShape::Interface => implements(key, candidate),
        TypeShape::Struct | TypeShape::StructRef | TypeShape::Primitive => {
            identical(key, candidate)
        }
        TypeShape::Unsupported => Err(not_supported(key)),
    }
}

/// Checks that `candidate` is a constructor for `key`: a function returning
/// exactly a value assignable to the key and an error.
pub fn verify_constructor_shape(
    key: &TypeDescriptor,
    candidate: &Candidate,
) -> Result<Coercion, BindingError> {
    let signature = function(key, candidate)?;
    match signature.returns.as_slice() {
        [ReturnSlot::Value(output), ReturnSlot::Error] => verify_value_assignable(key, output),
        returns => Err(BindingError::new(ErrorKind::ConstructorReturnValuesInvalid)
            .tag("expected", key.name())
            .tag("returns", returns.len())),
    }
}

/// Like [`verify_constructor_shape`], and the function must take exactly one
/// record whose fields are each injectable under their own key.
pub fn verify_tagged_constructor_shape(
    key: &TypeDescriptor,
    candidate: &Candidate,
) -> Result<Coercion, BindingError> {
    let signature = function(key, candidate)?;
    let fields = match &signature.inputs {
        Inputs::Record(fields) => fields,
        Inputs::Positional(params) => {
            return Err(BindingError::new(ErrorKind::TaggedParametersInvalid)
                .tag("expected", key.name())
                .tag("params", params.len()))
        }
    };
    for field in fields {
        verify_record_field(field).map_err(|err| err.tag("expected", key.name()))?;
    }
    verify_constructor_shape(key, candidate)
}

/// Checks one field of a tagged parameter record.
pub fn verify_record_field(field: &FieldSpec) -> Result<(), BindingError> {
    if field.tag() == Some("") {
        return Err(BindingError::new(ErrorKind::TagEmpty).tag("field", field.name()));
    }
    match field.descriptor().shape() {
        TypeShape::Interface | TypeShape::Struct | TypeShape::StructRef => Ok(()),
        shape @ (TypeShape::Primitive | TypeShape::Unsupported) => {
            Err(BindingError::new(ErrorKind::TaggedParametersInvalid)
                .tag("field", field.name())
                .tag("type", field.descriptor().name())
                .tag("shape", shape))
        }
    }
}

fn function<'c>(
    key: &TypeDescriptor,
    candidate: &'c Candidate,
) -> Result<&'c Signature, BindingError> {
    match candidate {
        Candidate::Function(signature) => Ok(signature),
        Candidate::Value(ty) => Err(BindingError::new(ErrorKind::NotFunction)
            .tag("expected", key.name())
            .tag("type", ty.name())),
    }
}

fn implements(key: &TypeDescriptor, candidate: &TypeDescriptor) -> Result<Coercion, BindingError> {
    if candidate.id() == key.id() {
        return Ok(Coercion::Identity);
    }
    match candidate.capability_for(key.id()) {
        Some(cap) => Ok(Coercion::Upcast(cap.upcast().clone())),
        None => Err(BindingError::new(ErrorKind::DoesNotImplement)
            .tag("expected", key.name())
            .tag("type", candidate.name())),
    }
}

fn identical(key: &TypeDescriptor, candidate: &TypeDescriptor) -> Result<Coercion, BindingError> {
    if candidate.id() == key.id() {
        Ok(Coercion::Identity)
    } else {
        Err(BindingError::new(ErrorKind::NotAssignable)
            .tag("expected", key.name())
            .tag("type", candidate.name()))
    }
}

fn not_supported(key: &TypeDescriptor) -> BindingError {
    BindingError::new(ErrorKind::NotSupportedYet)
        .tag("expected", key.name())
        .tag("shape", key.shape())
}
