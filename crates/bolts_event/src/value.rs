//! Invocation-time values and argument marshaling
//!
//! A [`Value`] is what listeners actually receive. Persisted arguments
//! ([`ArgumentCell`](crate::ArgumentCell)) materialize into values of the same
//! kind; callers of [`invoke_with`](crate::BoltsEvent::invoke_with) may also
//! pass [`Value::Opaque`] payloads that are never persisted.
//!
//! Conversions never coerce across kinds: an `Int` is not a `Float`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bolts_core::ObjectHandle;

use crate::error::ListenerError;

/// A typed value passed to a listener
#[derive(Clone)]
pub enum Value {
    /// 32-bit signed integer
    Int(i32),
    /// 32-bit float
    Float(f32),
    /// Text
    Text(String),
    /// Boolean
    Bool(bool),
    /// Reference to an object
    Object(ObjectHandle),
    /// Arbitrary in-process payload
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wrap an arbitrary payload
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Object(_) => "object",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow an opaque payload as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Object(v) => f.debug_tuple("Object").field(v).finish(),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // Payloads compare by identity
            (Value::Opaque(a), Value::Opaque(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<ObjectHandle> for Value {
    fn from(v: ObjectHandle) -> Self {
        Value::Object(v)
    }
}

/// A parameter type that can be read out of a [`Value`]
pub trait FromValue: Sized {
    /// Kind name used in mismatch reports
    const KIND: &'static str;

    /// Convert, or `None` if the value has a different kind
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i32 {
    const KIND: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for f32 {
    const KIND: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for String {
    const KIND: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromValue for bool {
    const KIND: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for ObjectHandle {
    const KIND: &'static str = "object";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object()
    }
}

impl FromValue for Value {
    const KIND: &'static str = "any";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// A fixed-arity parameter list decoded from a slice of values
///
/// Implemented for tuples of up to six [`FromValue`] types. The arity is known
/// statically, which is what typed listeners and registry methods declare.
pub trait ArgList: Sized {
    /// Number of parameters
    const ARITY: usize;

    /// Decode, checking the count first and then each kind in order
    fn from_values(values: &[Value]) -> Result<Self, ListenerError>;
}

fn check_arity(expected: usize, values: &[Value]) -> Result<(), ListenerError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ListenerError::ArityMismatch {
            expected,
            found: values.len(),
        })
    }
}

fn convert<T: FromValue>(values: &[Value], index: usize) -> Result<T, ListenerError> {
    let value = &values[index];
    T::from_value(value).ok_or(ListenerError::TypeMismatch {
        index,
        expected: T::KIND,
        found: value.type_name(),
    })
}

/// Implement ArgList for tuples
macro_rules! impl_arg_list {
    ($arity:expr; $($T:ident => $index:tt),*) => {
        impl<$($T: FromValue),*> ArgList for ($($T,)*) {
            const ARITY: usize = $arity;

            fn from_values(values: &[Value]) -> Result<Self, ListenerError> {
                check_arity(Self::ARITY, values)?;
                Ok(($(convert::<$T>(values, $index)?,)*))
            }
        }
    };
}

impl_arg_list!(0;);
impl_arg_list!(1; A => 0);
impl_arg_list!(2; A => 0, B => 1);
impl_arg_list!(3; A => 0, B => 1, C => 2);
impl_arg_list!(4; A => 0, B => 1, C => 2, D => 3);
impl_arg_list!(5; A => 0, B => 1, C => 2, D => 3, E => 4);
impl_arg_list!(6; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cross_kind_coercion() {
        assert_eq!(Value::Int(3).as_float(), None);
        assert_eq!(Value::Float(3.0).as_int(), None);
        assert_eq!(Value::from("3").as_int(), None);
        assert_eq!(Value::Bool(true).as_int(), None);
    }

    #[test]
    fn test_arg_list_decoding() {
        let args = [Value::Int(7), Value::from("door"), Value::Bool(true)];
        let (n, name, open) = <(i32, String, bool)>::from_values(&args).unwrap();
        assert_eq!(n, 7);
        assert_eq!(name, "door");
        assert!(open);

        assert_eq!(<()>::ARITY, 0);
        assert!(<()>::from_values(&[]).is_ok());
    }

    #[test]
    fn test_arg_list_arity_mismatch() {
        let err = <(i32, i32)>::from_values(&[Value::Int(1)]).unwrap_err();
        assert_eq!(err, ListenerError::ArityMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_arg_list_type_mismatch() {
        let err = <(i32, f32)>::from_values(&[Value::Int(1), Value::Int(2)]).unwrap_err();
        assert_eq!(
            err,
            ListenerError::TypeMismatch {
                index: 1,
                expected: "float",
                found: "int",
            }
        );
    }

    #[test]
    fn test_opaque_payload() {
        #[derive(Debug, PartialEq)]
        struct Hit {
            damage: u32,
        }

        let value = Value::opaque(Hit { damage: 12 });
        assert_eq!(value.downcast_ref::<Hit>(), Some(&Hit { damage: 12 }));
        assert_eq!(value.downcast_ref::<u32>(), None);
        assert_eq!(value, value.clone());
        assert_ne!(value, Value::opaque(Hit { damage: 12 }));
    }
}
