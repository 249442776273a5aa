//! Runtime reflection of records: declared fields, their raw annotations and shapes.
//!
//! The tables here are emitted by `derive(Record)` and are the only way the
//! decoder learns about a record. Nothing in them is validated until a
//! [`Descriptor`](crate::Descriptor) is built from it.

use std::fmt;

use crate::ValueError;
use crate::values::{Field, Value};

/// Trait of annotated structs.
///
/// You should only get an implementation via [`derive(Record)`](macro@crate::Record).
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an argtag record",
    label = "this type is expected to have `derive(argtag::Record)` but it is not"
)]
pub trait Record: Field {
    /// Name of the struct.
    const NAME: &'static str;

    /// Declared fields in declaration order.
    const FIELDS: &'static [FieldMeta];

    /// Construct from one value per field, in declaration order.
    ///
    /// Missing trailing values are taken as zero values.
    fn from_values(values: Vec<Value>) -> Result<Self, ValueError>;
}

/// Static description of one declared field, as written by its author.
#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    /// Display name of the value, eg. `OUT_DIR` for field `out_dir`.
    pub value_name: &'static str,
    /// Verbatim `argtag` annotation.
    pub primary: Option<&'static str>,
    /// Verbatim `argtag_help` annotation.
    pub help: Option<&'static str>,
    /// Verbatim `argtag_default` annotation.
    pub default: Option<&'static str>,
    /// Collected doc-comments, used when there is no help annotation.
    pub doc: &'static str,
    pub shape: fn() -> Shape,
}

/// The shape of a field type, driving value coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    String,
    /// Growable sequence, eg. `Vec<T>`.
    Seq(Box<Shape>),
    /// Fixed-size array `[T; N]`.
    Array(Box<Shape>, usize),
    /// String-keyed mapping.
    Map(Box<Shape>),
    Record(RecordShape),
}

impl Shape {
    /// Element shape of `Seq` or `Array`.
    #[must_use]
    pub fn element(&self) -> Option<&Shape> {
        match self {
            Self::Seq(elem) | Self::Array(elem, _) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int(w) => write!(f, "i{w}"),
            Self::Uint(w) => write!(f, "u{w}"),
            Self::Float(FloatWidth::F32) => f.write_str("f32"),
            Self::Float(FloatWidth::F64) => f.write_str("f64"),
            Self::String => f.write_str("String"),
            Self::Seq(elem) => write!(f, "Vec<{elem}>"),
            Self::Array(elem, n) => write!(f, "[{elem}; {n}]"),
            Self::Map(value) => write!(f, "map<String, {value}>"),
            Self::Record(r) => f.write_str(r.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    Size,
}

impl IntWidth {
    pub(crate) fn signed_range(self) -> (i64, i64) {
        match self {
            Self::W8 => (i8::MIN.into(), i8::MAX.into()),
            Self::W16 => (i16::MIN.into(), i16::MAX.into()),
            Self::W32 => (i32::MIN.into(), i32::MAX.into()),
            Self::W64 => (i64::MIN, i64::MAX),
            // Lossless on all supported targets.
            Self::Size => (isize::MIN as i64, isize::MAX as i64),
        }
    }

    pub(crate) fn unsigned_max(self) -> u64 {
        match self {
            Self::W8 => u8::MAX.into(),
            Self::W16 => u16::MAX.into(),
            Self::W32 => u32::MAX.into(),
            Self::W64 => u64::MAX,
            Self::Size => usize::MAX as u64,
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::W8 => f.write_str("8"),
            Self::W16 => f.write_str("16"),
            Self::W32 => f.write_str("32"),
            Self::W64 => f.write_str("64"),
            Self::Size => f.write_str("size"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

/// Shape of a nested record. Fields are reached lazily through [`FieldMeta::shape`],
/// so self-referencing records do not recurse here.
#[derive(Debug, Clone, Copy)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: &'static [FieldMeta],
}

impl RecordShape {
    #[must_use]
    pub fn of<R: Record>() -> Self {
        Self { name: R::NAME, fields: R::FIELDS }
    }

    /// Find the field a JSON key refers to, with how closely it matched.
    ///
    /// Tried in order: the exact name, the name ignoring ASCII case, then the
    /// name ignoring ASCII case and `_`/`-` separators, so that `outDir`,
    /// `OutDir` and `out-dir` all refer to `out_dir`.
    pub(crate) fn lookup(&self, key: &str) -> Option<(usize, KeyMatch)> {
        let find = |eq: fn(&str, &str) -> bool| self.fields.iter().position(|f| eq(f.name, key));
        find(|name, key| name == key)
            .map(|i| (i, KeyMatch::Exact))
            .or_else(|| find(str::eq_ignore_ascii_case).map(|i| (i, KeyMatch::IgnoreCase)))
            .or_else(|| {
                find(|name, key| fold_key(name).eq(fold_key(key))).map(|i| (i, KeyMatch::Folded))
            })
    }
}

/// Closeness of a key match. Closer matches compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum KeyMatch {
    Folded,
    IgnoreCase,
    Exact,
}

fn fold_key(s: &str) -> impl Iterator<Item = u8> + '_ {
    s.bytes().filter(|b| !matches!(b, b'_' | b'-')).map(|b| b.to_ascii_lowercase())
}

impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::eq(self.fields, other.fields)
    }
}
