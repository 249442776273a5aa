use std::collections::BTreeMap;

use argtag::{ArgKind, Error, Parser, Record, ValueError, decode_from, describe};
use serde_json::json;

#[derive(Debug, Default, PartialEq, Record)]
struct Interleave {
    #[argtag("arg,required")]
    name: String,
    #[argtag("option,-b,required")]
    b: i32,
}

#[track_caller]
fn parse<R: Record>(tokens: &[&str]) -> R {
    R::try_parse_from(tokens).unwrap()
}

#[track_caller]
fn parse_err<R: Record + std::fmt::Debug>(tokens: &[&str]) -> Error {
    R::try_parse_from(tokens).unwrap_err()
}

#[test]
fn positional_and_option_interleave() {
    let expect = Interleave { name: "hello".into(), b: 5 };
    assert_eq!(parse::<Interleave>(&["-b", "5", "hello"]), expect);
    assert_eq!(parse::<Interleave>(&["hello", "-b", "5"]), expect);
}

#[test]
fn required_count_short_circuit() {
    let err = parse_err::<Interleave>(&["hello"]);
    assert!(matches!(err, Error::NotEnoughRequiredArgs { expected: 2, actual: 1 }), "{err:?}");
}

#[test]
fn required_not_found() {
    let err = parse_err::<Interleave>(&["hello", "world"]);
    match err {
        Error::ArgNotFound { kind, description } => {
            assert_eq!(kind, ArgKind::Option);
            assert_eq!(description, "-b <B>");
        }
        err => panic!("unexpected {err:?}"),
    }
    assert_eq!(
        parse_err::<Interleave>(&["hello", "world"]).to_string(),
        "required option argument `-b <B>` was not passed",
    );
}

#[derive(Debug, Record)]
struct Switches {
    #[argtag("flag,-v,--verbose")]
    verbose: bool,
    #[argtag("flag,-q")]
    #[argtag_default("true")]
    quiet: bool,
    #[argtag("option,--level")]
    #[argtag_default("3")]
    level: u8,
    #[argtag("option,--name")]
    name: String,
}

#[test]
fn defaults_and_zero_values() {
    let s = parse::<Switches>(&[]);
    assert!(!s.verbose);
    assert!(s.quiet);
    assert_eq!(s.level, 3);
    assert_eq!(s.name, "");

    let s = parse::<Switches>(&["--verbose", "-q", "--level", "9", "--name", "x y"]);
    assert!(s.verbose);
    // Presence always means true.
    assert!(s.quiet);
    assert_eq!(s.level, 9);
    assert_eq!(s.name, "x y");
}

#[test]
fn first_match_wins_and_rest_is_ignored() {
    let s = parse::<Switches>(&["--level", "1", "--level", "2", "stray"]);
    assert_eq!(s.level, 1);
}

#[test]
fn overflow_is_rejected() {
    let err = parse_err::<Switches>(&["--level", "300"]);
    match err {
        Error::WrongArgValue { arg, source: ValueError::Overflow { input, expected } } => {
            assert_eq!(arg, "--level <LEVEL>");
            assert_eq!(input, "300");
            assert_eq!(expected, "u8");
        }
        err => panic!("unexpected {err:?}"),
    }
}

#[test]
fn missing_option_value() {
    match parse_err::<Switches>(&["--name"]) {
        Error::WrongArgValue { source: ValueError::MissingValue { flag }, .. } => {
            assert_eq!(flag, "--name");
        }
        err => panic!("unexpected {err:?}"),
    }
}

#[derive(Debug, Record)]
struct Multi {
    #[argtag("option,-c,nargs=2")]
    pair: Vec<String>,
    #[argtag("option,-n,nargs=3")]
    nums: [i16; 4],
    #[argtag("option,--json")]
    json: Vec<u32>,
    #[argtag("arg")]
    rest: String,
}

#[test]
fn nargs_values() {
    let m = parse::<Multi>(&["-c", "-x", "y", "-n", "1", "2", "3", "--json", "[4, 5]", "tail"]);
    // String elements may look like flags.
    assert_eq!(m.pair, ["-x", "y"]);
    assert_eq!(m.nums, [1, 2, 3, 0]);
    assert_eq!(m.json, [4, 5]);
    assert_eq!(m.rest, "tail");
}

#[test]
fn nargs_underfill() {
    let err = parse_err::<Multi>(&["-c", "only"]);
    assert!(
        matches!(
            err,
            Error::WrongArgValue {
                source: ValueError::NotEnoughValues { required: 2, passed: 1 },
                ..
            }
        ),
        "{err:?}",
    );
    assert_eq!(
        parse_err::<Multi>(&["-c", "only"]).to_string(),
        "wrong value for argument `-c <PAIR>`: not enough option values, required: 2, passed: 1",
    );

    // Non-string elements stop at flag-shaped tokens.
    let err = parse_err::<Multi>(&["-n", "1", "2", "--json", "[]"]);
    assert!(
        matches!(err, Error::WrongArgValue { source: ValueError::NotEnoughValues { .. }, .. }),
        "{err:?}",
    );
}

#[derive(Debug, Default, PartialEq, Record)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, Record)]
struct Nested {
    #[argtag("option,-p")]
    #[argtag_default(r#"{"x": 1, "y": -1}"#)]
    point: Point,
    #[argtag("option,-m")]
    #[argtag_default(r#"{"a": [1.5], "b": []}"#)]
    map: BTreeMap<String, Vec<f64>>,
    #[argtag("option,-z")]
    #[argtag_default(r#"[["1", "2"], ["3"]]"#)]
    grid: Vec<Vec<String>>,
}

#[test]
fn nested_defaults() {
    let n = parse::<Nested>(&[]);
    assert_eq!(n.point, Point { x: 1, y: -1 });
    assert_eq!(n.map, BTreeMap::from([("a".into(), vec![1.5]), ("b".into(), vec![])]));
    assert_eq!(n.grid, [vec!["1", "2"], vec!["3"]]);

    // Unknown keys are ignored and missing ones are zero. Keys match case-insensitively.
    let n = parse::<Nested>(&["-p", r#"{"X": 7, "w": 0}"#]);
    assert_eq!(n.point, Point { x: 7, y: 0 });

    let err = parse_err::<Nested>(&["-p", r#"{"x": "7"}"#]);
    assert!(
        matches!(err, Error::WrongArgValue { source: ValueError::WrongValueType { .. }, .. }),
        "{err:?}",
    );
    let err = parse_err::<Nested>(&["-z", "[[1]"]);
    assert!(matches!(err, Error::WrongArgValue { source: ValueError::Json(_), .. }), "{err:?}");
}

#[test]
fn defaults_convert_back_to_json() {
    let defaults = describe::<Nested>()
        .unwrap()
        .into_iter()
        .map(|d| serde_json::Value::from(d.default.unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(
        defaults,
        [json!({"x": 1, "y": -1}), json!({"a": [1.5], "b": []}), json!([["1", "2"], ["3"]])],
    );
}

#[derive(Debug, Default, PartialEq, Record)]
struct Paths {
    out_dir: String,
    depth: u8,
}

#[derive(Debug, Record)]
struct Build {
    #[argtag("option,--paths")]
    paths: Paths,
}

#[test]
fn record_keys() {
    let paths = |raw: &str| parse::<Build>(&["--paths", raw]).paths;
    assert_eq!(paths(r#"{"outDir": "a", "DEPTH": 2}"#), Paths { out_dir: "a".into(), depth: 2 });
    assert_eq!(paths(r#"{"out-dir": "b"}"#).out_dir, "b");
    // The closest spelling wins over key order.
    assert_eq!(paths(r#"{"out_dir": "exact", "outdir": "folded"}"#).out_dir, "exact");
    assert_eq!(paths(r#"{"OutDir": "folded", "OUT_DIR": "case"}"#).out_dir, "case");
    // A losing spelling is never decoded.
    assert_eq!(paths(r#"{"depth": 1, "Depth": "x"}"#).depth, 1);
}

#[test]
fn help_short_circuits() {
    // Would fail the required count otherwise.
    let help = parse_err::<Interleave>(&["--help"]).try_into_help().unwrap();
    assert_eq!(help, "\n");
    assert!(parse_err::<Switches>(&["--level", "300", "-h"]).is_help());
    // Not a flag value.
    assert!(parse_err::<Interleave>(&["-b", "1", "x", "--", "-h"]).is_help());
}

#[test]
fn target_untouched_on_error() {
    let mut target = Interleave { name: "keep".into(), b: 42 };
    let err = decode_from(&mut target, ["-b", "oops", "x"]).unwrap_err();
    assert!(matches!(err, Error::WrongArgValue { source: ValueError::InvalidInt { .. }, .. }));
    assert_eq!(target, Interleave { name: "keep".into(), b: 42 });

    assert!(decode_from(&mut target, ["--help"]).unwrap_err().is_help());
    assert_eq!(target.b, 42);

    decode_from(&mut target, ["x", "-b", "-7"]).unwrap();
    assert_eq!(target, Interleave { name: "x".into(), b: -7 });
}
