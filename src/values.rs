use std::collections::{BTreeMap, HashMap};

use crate::ValueError;
use crate::refl::{FloatWidth, IntWidth, Record, RecordShape, Shape};

/// Field types that can be decoded from argument tokens.
///
/// Implemented for primitives, `String`, `Vec<T>`, `[T; N]`, string-keyed maps
/// and every `derive(Record)` struct.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be decoded from argument tokens",
    label = "unsupported field type",
    note = "supported types are bool, integers, floats, String, Vec<T>, [T; N], \
    HashMap<String, V>, BTreeMap<String, V> and structs with `derive(argtag::Record)`"
)]
pub trait Field: Sized + 'static {
    fn shape() -> Shape;

    /// Convert a value that was coerced against [`Field::shape`].
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// A decoded value. Its layout always follows the [`Shape`] it was coerced against.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// Elements of a `Seq` or `Array` shape. Arrays always carry exactly their capacity.
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Field values in declaration order.
    Record(Vec<(&'static str, Value)>),
}

impl Value {
    /// The zero value of a shape: what an unmatched, non-defaulted field gets.
    #[must_use]
    pub fn zero(shape: &Shape) -> Self {
        match shape {
            Shape::Bool => Self::Bool(false),
            Shape::Int(_) => Self::Int(0),
            Shape::Uint(_) => Self::Uint(0),
            Shape::Float(_) => Self::Float(0.0),
            Shape::String => Self::Str(String::new()),
            Shape::Seq(_) => Self::Seq(Vec::new()),
            Shape::Array(elem, n) => Self::Seq(vec![Self::zero(elem); *n]),
            Shape::Map(_) => Self::Map(BTreeMap::new()),
            Shape::Record(r) => {
                Self::Record(r.fields.iter().map(|f| (f.name, Self::zero(&(f.shape)()))).collect())
            }
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "signed integer",
            Self::Uint(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    fn mismatch<T: Field>(&self) -> ValueError {
        ValueError::WrongValueType { expected: T::shape().to_string(), actual: self.kind().into() }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::from(i),
            Value::Uint(u) => Self::from(u),
            // NaN and infinities have no JSON form.
            Value::Float(x) => serde_json::Number::from_f64(x).map_or(Self::Null, Self::Number),
            Value::Str(s) => Self::String(s),
            Value::Seq(elems) => Self::Array(elems.into_iter().map(Self::from).collect()),
            Value::Map(m) => Self::Object(m.into_iter().map(|(k, v)| (k, v.into())).collect()),
            Value::Record(fields) => {
                Self::Object(fields.into_iter().map(|(k, v)| (k.to_owned(), v.into())).collect())
            }
        }
    }
}

impl Field for bool {
    fn shape() -> Shape {
        Shape::Bool
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

impl Field for String {
    fn shape() -> Shape {
        Shape::String
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

macro_rules! impl_int_field {
    ($($variant:ident, $width:ident: $($ty:ty),*;)*) => {
        $($(
            impl Field for $ty {
                fn shape() -> Shape {
                    Shape::$variant(IntWidth::$width)
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::$variant(n) => <$ty>::try_from(n).map_err(|_| ValueError::Overflow {
                            input: n.to_string(),
                            expected: Self::shape().to_string(),
                        }),
                        v => Err(v.mismatch::<Self>()),
                    }
                }
            }
        )*)*
    };
}

impl_int_field! {
    Int, W8: i8;
    Int, W16: i16;
    Int, W32: i32;
    Int, W64: i64;
    Int, Size: isize;
    Uint, W8: u8;
    Uint, W16: u16;
    Uint, W32: u32;
    Uint, W64: u64;
    Uint, Size: usize;
}

impl Field for f64 {
    fn shape() -> Shape {
        Shape::Float(FloatWidth::F64)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(x) => Ok(x),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

impl Field for f32 {
    fn shape() -> Shape {
        Shape::Float(FloatWidth::F32)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            // Range is checked during coercion.
            Value::Float(x) => Ok(x as f32),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

impl<T: Field> Field for Vec<T> {
    fn shape() -> Shape {
        Shape::Seq(Box::new(T::shape()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Seq(elems) => elems.into_iter().map(T::from_value).collect(),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

impl<T: Field, const N: usize> Field for [T; N] {
    fn shape() -> Shape {
        Shape::Array(Box::new(T::shape()), N)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let elems = Vec::<T>::from_value(value)?;
        let len = elems.len();
        elems.try_into().map_err(|_| ValueError::WrongValueType {
            expected: Self::shape().to_string(),
            actual: format!("sequence of {len}"),
        })
    }
}

impl<V: Field> Field for BTreeMap<String, V> {
    fn shape() -> Shape {
        Shape::Map(Box::new(V::shape()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(m) => m.into_iter().map(|(k, v)| Ok((k, V::from_value(v)?))).collect(),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

impl<V: Field> Field for HashMap<String, V> {
    fn shape() -> Shape {
        Shape::Map(Box::new(V::shape()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(m) => m.into_iter().map(|(k, v)| Ok((k, V::from_value(v)?))).collect(),
            v => Err(v.mismatch::<Self>()),
        }
    }
}

// Used by proc-macro.

pub fn record_shape<R: Record>() -> Shape {
    Shape::Record(RecordShape::of::<R>())
}

pub fn record_from_value<R: Record>(value: Value) -> Result<R, ValueError> {
    match value {
        Value::Record(fields) => R::from_values(fields.into_iter().map(|(_, v)| v).collect()),
        v => Err(ValueError::WrongValueType { expected: R::NAME.into(), actual: v.kind().into() }),
    }
}

pub fn take_field<T: Field>(values: &mut impl Iterator<Item = Value>) -> Result<T, ValueError> {
    let value = values.next().unwrap_or_else(|| Value::zero(&T::shape()));
    T::from_value(value)
}
