use std::thread;

use argtree_core::*;
use argtree_parser::{Parser, expand_args};

fn to_args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_expansion_without_triggers_is_identity() {
    let config = ParserConfig::default();
    let inputs: &[&[&str]] = &[
        &[],
        &["-v", "--name=x", "file.txt"],
        &["a@b", "@", "--", "-"],
    ];
    for input in inputs {
        let args = to_args(input);
        assert_eq!(expand_args(&args, &config).unwrap(), args);
    }
}

#[test]
fn test_shape_law_for_value_options() {
    let arities = [
        Arity::one(),
        Arity::optional(),
        Arity::exactly(2),
        Arity::range(1, 3),
        Arity::at_least(1),
        Arity::any(),
    ];
    let config = ParserConfig::default();

    for arity in arities {
        let spec = CommandDef::new("t")
            .with_option(OptionDef::value("opt").with_arity(arity))
            .build()
            .unwrap();
        let parser = Parser::new(&spec, &config).unwrap();

        for supplied in 0..=4usize {
            let mut args = vec!["--opt".to_string()];
            args.extend((0..supplied).map(|i| i.to_string()));

            let Ok(result) = parser.parse(args) else {
                assert!(supplied < arity.min || arity.max.is_some_and(|m| supplied > m));
                continue;
            };
            let value = result.option("opt").unwrap();
            if arity.is_scalar() {
                assert!(value.as_str().is_some(), "{arity} should yield a scalar");
            } else {
                let items = value.as_list().expect("non-scalar arity yields a list");
                assert!(arity.accepts(items.len()), "{arity} got {} items", items.len());
            }
        }
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let spec = CommandDef::new("t")
        .with_option(OptionDef::dict("set").with_arity(Arity::at_least(1)))
        .with_option(OptionDef::flag("v").with_short('v').with_accumulation(Accumulation::Count))
        .with_positional(PositionalDef::new("rest", Arity::any()))
        .build()
        .unwrap();
    let config = ParserConfig::default();
    let parser = Parser::new(&spec, &config).unwrap();

    let ok = ["x", "-vv", "--set", "b.c=1", "a=2", "--", "-y"];
    assert_eq!(parser.parse(ok).unwrap(), parser.parse(ok).unwrap());

    let bad = ["--set", "a", "--nope"];
    assert_eq!(parser.parse(bad).unwrap_err(), parser.parse(bad).unwrap_err());
}

#[test]
fn test_extend_equals_concatenated_append() {
    let config = ParserConfig::default();
    let args = ["--tag", "a", "b", "--tag", "c", "--tag", "d", "e", "f"];

    let build = |mode| {
        CommandDef::new("t")
            .with_option(
                OptionDef::value("tag")
                    .with_arity(Arity::at_least(1))
                    .with_accumulation(mode),
            )
            .build()
            .unwrap()
    };
    let append_spec = build(Accumulation::Append);
    let extend_spec = build(Accumulation::Extend);

    let appended = Parser::new(&append_spec, &config).unwrap().parse(args).unwrap();
    let extended = Parser::new(&extend_spec, &config).unwrap().parse(args).unwrap();

    let concatenated: Vec<Value> = appended.option("tag").unwrap().as_list().unwrap()
        .iter()
        .flat_map(|group| group.as_list().unwrap().to_vec())
        .collect();
    assert_eq!(extended.option("tag"), Some(&Value::List(concatenated)));
}

#[test]
fn test_same_names_at_different_levels_stay_separate() {
    let spec = CommandDef::new("root")
        .with_option(OptionDef::value("name"))
        .with_positional(PositionalDef::new("target", Arity::optional()))
        .with_subcommand(
            CommandDef::new("child")
                .with_option(OptionDef::value("name"))
                .with_positional(PositionalDef::new("target", Arity::optional()))
                .with_subcommand(CommandDef::new("root").with_option(OptionDef::flag("name"))),
        )
        .build()
        .unwrap();
    let config = ParserConfig::default();
    let parser = Parser::new(&spec, &config).unwrap();

    let result = parser
        .parse(["--name", "outer", "child", "--name", "inner", "root", "--name"])
        .unwrap();

    assert_eq!(result.option("name"), Some(&Value::from("outer")));
    assert_eq!(result.positional("target"), None);

    let child = result.subcommand().unwrap();
    assert_eq!(child.option("name"), Some(&Value::from("inner")));

    let grandchild = child.subcommand().unwrap();
    assert_eq!(grandchild.option("name"), Some(&Value::Bool(true)));
    assert_eq!(result.command_path(), ["root", "child", "root"]);
}

#[test]
fn test_parser_is_shared_across_threads() {
    let spec = CommandDef::new("t")
        .with_option(OptionDef::value("id"))
        .build()
        .unwrap();
    let config = ParserConfig::default();
    let parser = Parser::new(&spec, &config).unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let parser = &parser;
                scope.spawn(move || parser.parse(["--id".to_string(), i.to_string()]).unwrap())
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert_eq!(result.option("id"), Some(&Value::from(i.to_string())));
        }
    });
}

#[test]
fn test_result_serializes_as_plain_data() {
    let spec = CommandDef::new("t")
        .with_option(OptionDef::flag("v").with_short('v').with_accumulation(Accumulation::Count))
        .with_option(OptionDef::dict("set"))
        .with_positional(PositionalDef::required("file"))
        .build()
        .unwrap();
    let config = ParserConfig::default();
    let result = Parser::new(&spec, &config)
        .unwrap()
        .parse(["-vv", "--set", "a.b=1", "f.txt"])
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "command": "t",
            "argv": ["-vv", "--set", "a.b=1", "f.txt"],
            "options": {"v": 2, "set": {"a": {"b": "1"}}},
            "positionals": {"file": "f.txt"},
        })
    );
}
