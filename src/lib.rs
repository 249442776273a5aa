//! *Declarative command line decoder driven by per-field annotations.*
//!
//! A struct deriving [`Record`][macro@Record] describes every field with an
//! annotation string. Decoding walks the invocation tokens, consumes the ones
//! matching each field and fills the struct with typed values.
//!
//! ```
//! use argtag::{Parser, Record};
//!
//! #[derive(Debug, Record)]
//! struct Cli {
//!     #[argtag("arg")]
//!     #[argtag_help("input file")]
//!     input: String,
//!     #[argtag("option,-j,--jobs")]
//!     #[argtag_default("4")]
//!     jobs: u8,
//!     #[argtag("option,-D,nargs=2")]
//!     define: Vec<String>,
//!     #[argtag("flag,-v,--verbose")]
//!     verbose: bool,
//! }
//!
//! let cli = Cli::try_parse_from(["-D", "k", "v", "in.txt", "-v"]).unwrap();
//! assert_eq!(cli.input, "in.txt");
//! assert_eq!(cli.jobs, 4);
//! assert_eq!(cli.define, ["k", "v"]);
//! assert!(cli.verbose);
//! ```
#![forbid(unsafe_code)]
use std::ffi::OsString;

mod coerce;
mod descriptor;
mod error;
mod help;
mod refl;
mod runtime;
mod shared;
mod tokens;
mod values;

pub use crate::coerce::coerce;
pub use crate::descriptor::{ArgKind, Descriptor};
pub use crate::error::{Error, ValueError};
pub use crate::refl::{FieldMeta, FloatWidth, IntWidth, Record, RecordShape, Shape};
pub use crate::shared::Annotation;
pub use crate::values::{Field, Value};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Not public API. Only for proc-macro internal use.
#[doc(hidden)]
pub mod __private {
    pub use {None, Ok, Option, Result, Some, Vec, str};

    pub use crate::ValueError;
    pub use crate::refl::{FieldMeta, Record, Shape};
    pub use crate::values::{Field, Value, record_from_value, record_shape, take_field};

    // Macros.
    pub use std::unreachable;
}

/// Decode the process arguments (program name excluded) into `target`.
///
/// `target` is only replaced when every field is resolved. On error, including
/// [`Error::Help`], it is left untouched.
///
/// # Errors
///
/// Schema errors from annotations, input errors, or the help signal.
pub fn decode<R: Record>(target: &mut R) -> Result<()> {
    decode_from(target, std::env::args_os().skip(1))
}

/// Like [`decode`], but with explicit tokens.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_from<R, I, T>(target: &mut R, tokens: I) -> Result<()>
where
    R: Record,
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    *target = R::try_parse_from(tokens)?;
    Ok(())
}

/// Build descriptors of all fields of `R`, in decoding order (positionals last).
///
/// # Errors
///
/// Schema errors from annotations.
pub fn describe<R: Record>() -> Result<Vec<Descriptor>> {
    descriptor::build_ordered(R::FIELDS)
}

/// Top-level decoding interface, available on every [`Record`].
pub trait Parser: Record {
    /// Decode the process arguments. Print help and exit with 0 if requested,
    /// or print the error and exit with 1 on failure.
    fn parse() -> Self {
        match Self::try_parse_from(std::env::args_os().skip(1)) {
            Ok(v) => v,
            Err(Error::Help(help)) => {
                println!("{help}");
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
    }

    /// Decode from `tokens`, which exclude the program name.
    ///
    /// # Errors
    ///
    /// See [`decode`].
    fn try_parse_from<I, T>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        runtime::decode_tokens(tokens.into_iter().map(Into::into).collect())
    }

    /// The help message `--help` would produce.
    ///
    /// # Errors
    ///
    /// Schema errors from annotations.
    fn render_help() -> Result<String> {
        Ok(help::render_help(&describe::<Self>()?))
    }
}

impl<R: Record> Parser for R {}

/// Derive macro generating [`Record`][trait@Record] and [`Field`] implementations.
///
/// This macro only accepts non-generic `struct`s with named fields. The struct
/// can be decoded from tokens, and can be nested in other records, where its
/// value is given as a JSON object.
///
/// # Field attributes
///
/// Every field of a decoded struct needs the primary annotation. Annotations
/// are interpreted when decoding, so a malformed one is reported by the first
/// decode call, before any token is read.
///
/// - `#[argtag("<kind>,<param>...")]` or `#[argtag = "..."]`
///
///   `<kind>` is one of:
///   - `arg`: a positional value. Positionals are matched after all other
///     fields, in declaration order. Accepts `required`.
///   - `option`: flag spellings followed by a value. Accepts `required` and
///     `nargs=<N>`. Needs at least one flag.
///   - `flag`: a `bool` switch, `true` when present. Needs at least one flag.
///
///   Params:
///   - `-x`, `--long`: a flag spelling, matched verbatim.
///   - `required`: fail when not passed.
///   - `nargs=<N>`: on a `Vec<T>` or `[T; N]` field, take exactly `N`
///     following tokens as elements. Without it, one token is taken and
///     decoded as a JSON array.
///
/// - `#[argtag_help("...")]`
///
///   The help line of the field. Defaults to the first paragraph of the
///   doc-comment.
///
/// - `#[argtag_default("...")]`
///
///   Default value when the field is not passed. Plain literal for scalars,
///   JSON for sequences, maps and records. Not allowed on `arg` or `required`
///   fields. Fields without default take the zero value of their type.
///
/// Nested records used only inside JSON values need no annotations. A JSON key
/// refers to a field by its exact name, its name ignoring ASCII case, or its
/// name ignoring ASCII case and `_`/`-` separators (`outDir` for `out_dir`).
/// When several keys refer to the same field, the closest one is used and the
/// others are ignored. Unknown keys are ignored.
#[cfg(feature = "derive")]
pub use argtag_derive::Record;
