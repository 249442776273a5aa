//! Mapping raw strings to typed values, directed by a [`Shape`].
//!
//! Scalars are parsed directly. Sequences, mappings and records are first
//! decoded as a generic JSON document, then re-typed against the shape, since
//! generic JSON cannot recover integer widths, array capacities or field names.

use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::ValueError;
use crate::refl::{FloatWidth, IntWidth, KeyMatch, RecordShape, Shape};
use crate::values::Value;

/// Coerce a raw string against `shape`.
///
/// # Errors
///
/// Malformed literals, numbers out of the range of the destination, invalid
/// JSON, or JSON of the wrong kind.
pub fn coerce(shape: &Shape, raw: &str) -> Result<Value, ValueError> {
    match shape {
        Shape::Bool => parse_bool(raw).map(Value::Bool),
        Shape::Int(width) => {
            let n = raw
                .parse::<i64>()
                .map_err(|source| ValueError::InvalidInt { input: raw.into(), source })?;
            check_int(shape, *width, n, raw)
        }
        Shape::Uint(width) => {
            let n = raw
                .parse::<u64>()
                .map_err(|source| ValueError::InvalidInt { input: raw.into(), source })?;
            check_uint(shape, *width, n, raw)
        }
        Shape::Float(width) => {
            let x = raw
                .parse::<f64>()
                .map_err(|source| ValueError::InvalidFloat { input: raw.into(), source })?;
            check_float(shape, *width, x, raw)
        }
        Shape::String => Ok(Value::Str(raw.to_owned())),
        Shape::Seq(_) | Shape::Array(..) | Shape::Map(_) | Shape::Record(_) => {
            let json = serde_json::from_str::<Json>(raw)?;
            retype(shape, json)
        }
    }
}

/// The accepted spellings are `1 t T TRUE true True` and `0 f F FALSE false False`.
fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::InvalidBool { input: raw.into() }),
    }
}

fn overflow(shape: &Shape, input: impl ToString) -> ValueError {
    ValueError::Overflow { input: input.to_string(), expected: shape.to_string() }
}

fn check_int(shape: &Shape, width: IntWidth, n: i64, input: &str) -> Result<Value, ValueError> {
    let (min, max) = width.signed_range();
    if (min..=max).contains(&n) { Ok(Value::Int(n)) } else { Err(overflow(shape, input)) }
}

fn check_uint(shape: &Shape, width: IntWidth, n: u64, input: &str) -> Result<Value, ValueError> {
    if n <= width.unsigned_max() { Ok(Value::Uint(n)) } else { Err(overflow(shape, input)) }
}

fn check_float(shape: &Shape, width: FloatWidth, x: f64, input: &str) -> Result<Value, ValueError> {
    // Infinities and NaN are spelled out by the input, not produced by overflow.
    if width == FloatWidth::F32 && x.is_finite() && x.abs() > f64::from(f32::MAX) {
        return Err(overflow(shape, input));
    }
    Ok(Value::Float(x))
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(shape: &Shape, json: &Json) -> ValueError {
    ValueError::WrongValueType { expected: shape.to_string(), actual: json_kind(json).into() }
}

/// Re-type a generic JSON value against `shape`. `null` becomes the zero value.
fn retype(shape: &Shape, json: Json) -> Result<Value, ValueError> {
    if json.is_null() {
        return Ok(Value::zero(shape));
    }

    match (shape, json) {
        (Shape::Bool, Json::Bool(b)) => Ok(Value::Bool(b)),
        (Shape::Int(width), Json::Number(num)) => match num.as_i64() {
            Some(n) => check_int(shape, *width, n, &num.to_string()),
            None if num.is_u64() => Err(overflow(shape, num)),
            None => Err(ValueError::WrongValueType {
                expected: shape.to_string(),
                actual: format!("number {num}"),
            }),
        },
        (Shape::Uint(width), Json::Number(num)) => match num.as_u64() {
            Some(n) => check_uint(shape, *width, n, &num.to_string()),
            None if num.is_i64() => Err(overflow(shape, num)),
            None => Err(ValueError::WrongValueType {
                expected: shape.to_string(),
                actual: format!("number {num}"),
            }),
        },
        (Shape::Float(width), Json::Number(num)) => {
            // Always `Some` without the `arbitrary_precision` feature.
            let x = num.as_f64().unwrap_or(f64::NAN);
            check_float(shape, *width, x, &num.to_string())
        }
        (Shape::String, Json::String(s)) => Ok(Value::Str(s)),
        (Shape::Seq(elem), Json::Array(elems)) => {
            elems.into_iter().map(|e| retype(elem, e)).collect::<Result<_, _>>().map(Value::Seq)
        }
        (Shape::Array(elem, cap), Json::Array(elems)) => {
            let mut out = elems
                .into_iter()
                .take(*cap)
                .map(|e| retype(elem, e))
                .collect::<Result<Vec<_>, _>>()?;
            pad_array(&mut out, elem, *cap);
            Ok(Value::Seq(out))
        }
        (Shape::Map(value), Json::Object(obj)) => obj
            .into_iter()
            .map(|(k, v)| Ok((k, retype(value, v)?)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Map),
        (Shape::Record(record), Json::Object(obj)) => retype_record(record, obj),
        (shape, json) => Err(mismatch(shape, &json)),
    }
}

/// Fill a fixed-size array up to its capacity with zero values.
pub(crate) fn pad_array(elems: &mut Vec<Value>, elem: &Shape, cap: usize) {
    if elems.len() < cap {
        elems.resize(cap, Value::zero(elem));
    }
}

fn retype_record(
    record: &RecordShape,
    obj: serde_json::Map<String, Json>,
) -> Result<Value, ValueError> {
    let mut slots: Vec<Option<(KeyMatch, Json)>> = vec![None; record.fields.len()];
    for (key, json) in obj {
        // Unknown keys are ignored.
        let Some((idx, closeness)) = record.lookup(&key) else { continue };
        // The closest key of a field wins, regardless of key order.
        if slots[idx].as_ref().is_none_or(|(prev, _)| *prev < closeness) {
            slots[idx] = Some((closeness, json));
        }
    }
    let fields = record
        .fields
        .iter()
        .zip(slots)
        .map(|(f, slot)| -> Result<_, ValueError> {
            let shape = (f.shape)();
            let value = match slot {
                Some((_, json)) => retype(&shape, json)?,
                None => Value::zero(&shape),
            };
            Ok((f.name, value))
        })
        .collect::<Result<_, _>>()?;
    Ok(Value::Record(fields))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::values::Field;

    fn coerce_as<T: Field>(raw: &str) -> Result<T, ValueError> {
        T::from_value(coerce(&T::shape(), raw)?)
    }

    #[test]
    fn integers() {
        assert_eq!(coerce_as::<i32>("-42").unwrap(), -42);
        assert_eq!(coerce_as::<i8>("+127").unwrap(), 127);
        assert_eq!(coerce_as::<u64>("18446744073709551615").unwrap(), u64::MAX);
        assert!(matches!(coerce_as::<i8>("128"), Err(ValueError::Overflow { .. })));
        assert!(matches!(coerce_as::<u8>("256"), Err(ValueError::Overflow { .. })));
        assert!(matches!(coerce_as::<u8>("-1"), Err(ValueError::InvalidInt { .. })));
        assert!(matches!(coerce_as::<i64>("0x10"), Err(ValueError::InvalidInt { .. })));
    }

    #[test]
    fn floats() {
        assert_eq!(coerce_as::<f64>("1.5e3").unwrap(), 1500.0);
        assert_eq!(coerce_as::<f32>("0.25").unwrap(), 0.25);
        assert!(matches!(coerce_as::<f32>("1e39"), Err(ValueError::Overflow { .. })));
        assert!(coerce_as::<f64>("1e39").is_ok());
        assert!(matches!(coerce_as::<f64>("one"), Err(ValueError::InvalidFloat { .. })));
    }

    #[test]
    fn booleans() {
        for s in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(coerce_as::<bool>(s).unwrap(), "{s}");
        }
        for s in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!coerce_as::<bool>(s).unwrap(), "{s}");
        }
        assert!(matches!(coerce_as::<bool>("yes"), Err(ValueError::InvalidBool { .. })));
        assert!(matches!(coerce_as::<bool>("tRUE"), Err(ValueError::InvalidBool { .. })));
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(coerce_as::<String>(" -x, [1] ").unwrap(), " -x, [1] ");
    }

    #[test]
    fn nested_sequences_and_maps() {
        assert_eq!(
            coerce_as::<Vec<Vec<String>>>(r#"[["1","2"],[]]"#).unwrap(),
            vec![vec!["1".to_owned(), "2".to_owned()], vec![]],
        );
        let m = coerce_as::<HashMap<String, BTreeMap<String, i16>>>(r#"{"a": {"1": 1}}"#).unwrap();
        assert_eq!(m["a"]["1"], 1);
        assert!(matches!(
            coerce_as::<Vec<i8>>("[1, 300]"),
            Err(ValueError::Overflow { .. })
        ));
        assert!(matches!(
            coerce_as::<Vec<i32>>("[1.5]"),
            Err(ValueError::WrongValueType { .. })
        ));
        assert!(matches!(
            coerce_as::<Vec<u32>>(r#"{"a": 1}"#),
            Err(ValueError::WrongValueType { .. })
        ));
        assert!(matches!(coerce_as::<Vec<u32>>("[1,"), Err(ValueError::Json(_))));
    }

    #[test]
    fn arrays_pad_and_truncate() {
        assert_eq!(coerce_as::<[u8; 3]>("[1]").unwrap(), [1, 0, 0]);
        assert_eq!(coerce_as::<[u8; 2]>("[1, 2, 3]").unwrap(), [1, 2]);
        assert_eq!(coerce_as::<[String; 2]>("null").unwrap(), [String::new(), String::new()]);
    }

    #[test]
    fn null_is_zero() {
        assert_eq!(coerce_as::<Vec<i32>>("[null, 2]").unwrap(), [0, 2]);
        assert!(coerce_as::<BTreeMap<String, i32>>("null").unwrap().is_empty());
    }
}
