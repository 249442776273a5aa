use std::ffi::OsString;

use crate::coerce::{coerce, pad_array};
use crate::descriptor::{ArgKind, Descriptor, build_ordered};
use crate::help::render_help;
use crate::refl::{Record, Shape};
use crate::tokens::{TokenId, TokenStream};
use crate::values::Value;
use crate::{Error, Result, ValueError};

const HELP_FLAGS: [&str; 2] = ["--help", "-h"];

/// The main logic of decoding. Builds a fresh record from `tokens`.
///
/// Values of all fields are resolved before the record is constructed, so
/// nothing is observable from a failed call.
pub(crate) fn decode_tokens<R: Record>(tokens: Vec<OsString>) -> Result<R> {
    let descs = build_ordered(R::FIELDS)?;
    tracing::trace!(
        record = R::NAME,
        order = ?descs.iter().map(|d| d.name).collect::<Vec<_>>(),
        "descriptors built",
    );

    if tokens.iter().any(|t| HELP_FLAGS.iter().any(|h| t == h)) {
        return Err(Error::Help(render_help(&descs)));
    }

    let required = descs.iter().filter(|d| d.required).count();
    if required > tokens.len() {
        return Err(Error::NotEnoughRequiredArgs { expected: required, actual: tokens.len() });
    }

    let mut stream = TokenStream::new(tokens);
    let mut values = Vec::with_capacity(descs.len());
    for desc in &descs {
        let value = consume(desc, &mut stream)?;
        values.push((desc.index, value));
    }
    if stream.len() != 0 {
        tracing::debug!(rest = %stream, "unconsumed tokens are ignored");
    }

    values.sort_unstable_by_key(|(idx, _)| *idx);
    R::from_values(values.into_iter().map(|(_, v)| v).collect())
        .map_err(|source| Error::WrongArgValue { arg: R::NAME.into(), source })
}

/// Scan `stream` once for the first token matching `desc`, remove what it
/// consumes, and return its value. Falls back to the default or zero value.
fn consume(desc: &Descriptor, stream: &mut TokenStream) -> Result<Value> {
    let wrong_value =
        |source: ValueError| Error::WrongArgValue { arg: desc.description(), source };

    let mut cursor = stream.head();
    while let Some(id) = cursor {
        let tok = stream.get(id);
        let is_flag = tok.is_flag_shaped();

        match desc.kind {
            ArgKind::Positional if !is_flag => {
                // A value right after a flag-shaped token belongs to that option.
                let after_flag = stream.prev(id).is_some_and(|p| stream.get(p).is_flag_shaped());
                if !after_flag {
                    let value = tok
                        .to_str()
                        .and_then(|raw| coerce(&desc.shape, raw))
                        .map_err(wrong_value)?;
                    tracing::trace!(field = desc.name, "matched positional");
                    stream.remove(id);
                    return Ok(value);
                }
            }
            ArgKind::Option if is_flag && desc.accepts(tok.as_os_str()) => {
                let after = stream.next(id);
                let flag = stream.remove(id);
                tracing::trace!(field = desc.name, flag = ?flag, "matched option");
                return take_option_values(desc, stream, after, &flag).map_err(wrong_value);
            }
            ArgKind::Flag if is_flag && desc.accepts(tok.as_os_str()) => {
                tracing::trace!(field = desc.name, "matched flag");
                stream.remove(id);
                return Ok(Value::Bool(true));
            }
            _ => {}
        }
        cursor = stream.next(id);
    }

    if desc.required {
        return Err(Error::ArgNotFound { kind: desc.kind, description: desc.description() });
    }
    Ok(match &desc.default {
        Some(v) => {
            tracing::trace!(field = desc.name, "using default");
            v.clone()
        }
        None => {
            tracing::trace!(field = desc.name, "using zero value");
            Value::zero(&desc.shape)
        }
    })
}

/// Take the value(s) of an option whose `flag` token was just removed.
/// `cursor` is the token that followed the flag.
fn take_option_values(
    desc: &Descriptor,
    stream: &mut TokenStream,
    mut cursor: Option<TokenId>,
    flag: &OsString,
) -> Result<Value, ValueError> {
    let elem = match desc.shape.element() {
        Some(elem) if desc.nargs != 0 => elem,
        _ => {
            let id = cursor.ok_or_else(|| ValueError::MissingValue {
                flag: flag.to_string_lossy().into_owned(),
            })?;
            let value = coerce(&desc.shape, stream.get(id).to_str()?)?;
            stream.remove(id);
            return Ok(value);
        }
    };

    // Non-string elements stop at the next flag-shaped token.
    let accept_any = *elem == Shape::String;
    let mut elems = Vec::with_capacity(desc.nargs);
    while elems.len() < desc.nargs {
        let Some(id) = cursor.filter(|&id| accept_any || !stream.get(id).is_flag_shaped()) else {
            break;
        };
        elems.push(coerce(elem, stream.get(id).to_str()?)?);
        cursor = stream.next(id);
        stream.remove(id);
    }
    if elems.len() < desc.nargs {
        return Err(ValueError::NotEnoughValues { required: desc.nargs, passed: elems.len() });
    }

    if let Shape::Array(_, cap) = desc.shape {
        pad_array(&mut elems, elem, cap);
    }
    Ok(Value::Seq(elems))
}
