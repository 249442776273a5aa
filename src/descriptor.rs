//! Interpretation of per-field annotations into argument descriptors.
//!
//! The primary annotation is `<kind>,<param>...` where kind is one of `arg`,
//! `option` or `flag`. Params are flag spellings (`-b`, `--long`), `required`,
//! or `nargs=<N>`.

use std::fmt;

use crate::coerce::coerce;
use crate::refl::{FieldMeta, Shape};
use crate::shared::Annotation;
use crate::values::Value;
use crate::{Error, Result};

const NARGS_PREFIX: &str = "nargs=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A value taken by position.
    Positional,
    /// A flag followed by one or more values.
    Option,
    /// A boolean switch without a value.
    Flag,
}

impl ArgKind {
    fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "arg" => Self::Positional,
            "option" => Self::Option,
            "flag" => Self::Flag,
            _ => return None,
        })
    }

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Positional => "arg",
            Self::Option => "option",
            Self::Flag => "flag",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The validated, immutable description of how one field maps to tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub kind: ArgKind,
    /// Accepted spellings. Empty for positionals.
    pub flags: Vec<&'static str>,
    pub required: bool,
    /// Values taken per occurrence by a sequence option. 0 means a single value.
    pub nargs: usize,
    /// Pre-decoded default value.
    pub default: Option<Value>,
    pub help: &'static str,
    pub shape: Shape,
    /// Index of the field in declaration order.
    pub index: usize,
    pub name: &'static str,
    pub value_name: &'static str,
}

impl Descriptor {
    /// Build the descriptor of the `index`-th declared field.
    ///
    /// # Errors
    ///
    /// Missing, empty, unknown, or ill-formed annotations, and defaults that
    /// cannot be decoded into the field type.
    pub fn build(meta: &FieldMeta, index: usize) -> Result<Self> {
        let field = meta.name;
        let invalid = |annotation: Annotation, reason: String| Error::InvalidAnnotation {
            field,
            annotation,
            reason,
        };
        let invalid_primary = |reason: String| invalid(Annotation::Primary, reason);

        let primary = meta.primary.ok_or(Error::MissingPrimaryAnnotation { field })?;
        if primary.is_empty() {
            return Err(Error::EmptyAnnotation { field, annotation: Annotation::Primary });
        }

        let mut params = primary.split(',');
        let keyword = params.next().unwrap_or_default();
        let kind = ArgKind::from_keyword(keyword)
            .ok_or_else(|| Error::UnknownKind { field, kind: keyword.into() })?;

        let shape = (meta.shape)();
        if kind == ArgKind::Flag && shape != Shape::Bool {
            return Err(invalid_primary(format!("flag field must be bool, found {shape}")));
        }

        let mut flags = Vec::new();
        let mut required = false;
        let mut nargs = 0;
        for param in params {
            if param.starts_with('-') {
                if kind == ArgKind::Positional {
                    return Err(invalid_primary(format!("arg field cannot have flag `{param}`")));
                }
                flags.push(param);
            } else if param == "required" {
                if kind == ArgKind::Flag {
                    return Err(invalid_primary("flag field cannot be required".into()));
                }
                required = true;
            } else if let Some(n) =
                param.strip_prefix(NARGS_PREFIX).filter(|_| kind == ArgKind::Option)
            {
                nargs = n
                    .parse::<usize>()
                    .map_err(|_| invalid_primary(format!("invalid nargs value `{n}`")))?;
                match &shape {
                    Shape::Array(_, cap) if nargs > *cap => {
                        return Err(invalid_primary(format!(
                            "nargs={nargs} exceeds array capacity {cap}"
                        )));
                    }
                    Shape::Seq(_) | Shape::Array(..) => {}
                    _ if nargs > 1 => {
                        return Err(invalid_primary(format!("nargs>1 is invalid for {shape}")));
                    }
                    _ => {}
                }
            } else {
                return Err(invalid_primary(format!("unknown param `{param}` for {kind} field")));
            }
        }

        if kind != ArgKind::Positional && flags.is_empty() {
            return Err(invalid_primary(format!(
                "{kind} field must have at least one flag, like -name or --name"
            )));
        }

        // Doc-comments keep paragraphs on separate lines. Only the summary is a help line.
        let help = meta.help.unwrap_or_else(|| meta.doc.lines().next().unwrap_or_default());

        let default = match meta.default {
            Some(_) if kind == ArgKind::Positional => {
                return Err(invalid(Annotation::Default, "arg field cannot have a default".into()));
            }
            Some(_) if required => {
                return Err(invalid(
                    Annotation::Default,
                    "required field cannot have a default".into(),
                ));
            }
            Some(raw) => {
                let value = coerce(&shape, raw)
                    .map_err(|err| invalid(Annotation::Default, err.to_string()))?;
                if kind == ArgKind::Flag && !matches!(value, Value::Bool(_)) {
                    return Err(invalid(Annotation::Default, "flag default must be bool".into()));
                }
                Some(value)
            }
            None if kind == ArgKind::Flag => Some(Value::Bool(false)),
            None => None,
        };

        Ok(Self {
            kind,
            flags,
            required,
            nargs,
            default,
            help,
            shape,
            index,
            name: field,
            value_name: meta.value_name,
        })
    }

    /// Does `token` spell one of the flags of this descriptor?
    pub(crate) fn accepts(&self, token: &std::ffi::OsStr) -> bool {
        self.flags.iter().any(|f| token == *f)
    }

    /// Example-like description, eg. `<FILE>`, `-o, --out <OUT>`, `-v, --verbose`.
    #[must_use]
    pub fn description(&self) -> String {
        match self.kind {
            ArgKind::Positional => format!("<{}>", self.value_name),
            ArgKind::Flag => self.flags.join(", "),
            ArgKind::Option => format!("{} <{}>", self.flags.join(", "), self.value_name),
        }
    }
}

/// Build descriptors of all fields, then move positionals last, keeping the
/// relative declaration order within both groups.
pub(crate) fn build_ordered(fields: &[FieldMeta]) -> Result<Vec<Descriptor>> {
    let mut descs =
        fields.iter().enumerate().map(|(i, f)| Descriptor::build(f, i)).collect::<Result<Vec<_>>>()?;
    // Stable.
    descs.sort_by_key(|d| d.kind == ArgKind::Positional);
    Ok(descs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Field;

    fn meta<T: Field>(primary: Option<&'static str>) -> FieldMeta {
        FieldMeta {
            name: "field",
            value_name: "FIELD",
            primary,
            help: None,
            default: None,
            doc: "",
            shape: T::shape,
        }
    }

    fn build<T: Field>(primary: &'static str) -> Result<Descriptor> {
        Descriptor::build(&meta::<T>(Some(primary)), 0)
    }

    fn reason(ret: Result<Descriptor>) -> String {
        match ret {
            Err(Error::InvalidAnnotation { reason, .. }) => reason,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn kinds() {
        let d = build::<i32>("arg").unwrap();
        assert_eq!((d.kind, d.required, d.default), (ArgKind::Positional, false, None));

        let d = build::<i32>("option,-b,--b-flag,required").unwrap();
        assert_eq!(d.kind, ArgKind::Option);
        assert_eq!(d.flags, ["-b", "--b-flag"]);
        assert!(d.required);
        assert_eq!(d.description(), "-b, --b-flag <FIELD>");

        let d = build::<bool>("flag,-v").unwrap();
        assert_eq!(d.default, Some(Value::Bool(false)));
        assert!(!d.required);
    }

    #[test]
    fn annotation_presence() {
        assert!(matches!(
            Descriptor::build(&meta::<i32>(None), 0),
            Err(Error::MissingPrimaryAnnotation { field: "field" })
        ));
        assert!(matches!(build::<i32>(""), Err(Error::EmptyAnnotation { .. })));
        assert!(matches!(
            build::<i32>("positional"),
            Err(Error::UnknownKind { kind, .. }) if kind == "positional"
        ));
    }

    #[test]
    fn invalid_grammar() {
        assert!(reason(build::<i32>("flag,-v")).contains("must be bool"));
        assert!(reason(build::<i32>("option")).contains("at least one flag"));
        assert!(reason(build::<bool>("flag,required,-v")).contains("cannot be required"));
        assert!(reason(build::<i32>("arg,-a")).contains("cannot have flag"));
        assert!(reason(build::<i32>("arg,nargs=2")).contains("unknown param"));
        assert!(reason(build::<i32>("option,-a,")).contains("unknown param ``"));
        assert!(reason(build::<i32>("option,-a,nargs=x")).contains("invalid nargs"));
        assert!(reason(build::<i32>("option,-a,nargs=2")).contains("nargs>1"));
        assert!(reason(build::<[u8; 2]>("option,-a,nargs=3")).contains("capacity"));
    }

    #[test]
    fn nargs() {
        assert_eq!(build::<Vec<String>>("option,-c,nargs=3").unwrap().nargs, 3);
        assert_eq!(build::<[u8; 2]>("option,-c,nargs=2").unwrap().nargs, 2);
        // A single value is fine for any type.
        assert_eq!(build::<u8>("option,-c,nargs=1").unwrap().nargs, 1);
    }

    #[test]
    fn defaults() {
        let mut m = meta::<Vec<Vec<String>>>(Some("option,-z,nargs=2"));
        m.default = Some(r#"[["1","2"]]"#);
        let d = Descriptor::build(&m, 0).unwrap();
        let json = serde_json::Value::from(d.default.unwrap());
        assert_eq!(json, serde_json::json!([["1", "2"]]));

        m.default = Some("[[1]]");
        assert!(matches!(
            Descriptor::build(&m, 0),
            Err(Error::InvalidAnnotation { annotation: Annotation::Default, .. })
        ));

        let mut m = meta::<i32>(Some("arg"));
        m.default = Some("1");
        assert!(reason(Descriptor::build(&m, 0)).contains("cannot have a default"));

        let mut m = meta::<i32>(Some("option,-a,required"));
        m.default = Some("1");
        assert!(reason(Descriptor::build(&m, 0)).contains("required"));

        let mut m = meta::<bool>(Some("flag,-a"));
        m.default = Some("true");
        assert_eq!(Descriptor::build(&m, 0).unwrap().default, Some(Value::Bool(true)));
    }

    #[test]
    fn help_falls_back_to_doc() {
        let mut m = meta::<i32>(Some("arg"));
        m.doc = "From doc.";
        assert_eq!(Descriptor::build(&m, 0).unwrap().help, "From doc.");
        m.doc = "Summary.\nSecond paragraph.";
        assert_eq!(Descriptor::build(&m, 0).unwrap().help, "Summary.");
        m.help = Some("");
        assert_eq!(Descriptor::build(&m, 0).unwrap().help, "");
    }

    #[test]
    fn idempotent() {
        let mut m = meta::<Vec<u16>>(Some("option,-n,--num,nargs=2"));
        m.default = Some("[1, 2]");
        assert_eq!(Descriptor::build(&m, 3).unwrap(), Descriptor::build(&m, 3).unwrap());
    }

    #[test]
    fn positionals_last() {
        let fields = [
            FieldMeta { name: "a", ..meta::<i32>(Some("arg")) },
            FieldMeta { name: "b", ..meta::<i32>(Some("option,-b")) },
            FieldMeta { name: "c", ..meta::<i32>(Some("arg")) },
            FieldMeta { name: "d", ..meta::<bool>(Some("flag,-d")) },
        ];
        let order = build_ordered(&fields).unwrap().iter().map(|d| d.name).collect::<Vec<_>>();
        assert_eq!(order, ["b", "d", "a", "c"]);
    }
}
