//! Show how parse errors point at the offending argument.
//!
//! Run with: `cargo run -p argtree-demos --example error_report`

use argtree_core::*;
use argtree_parser::Parser;

fn main() {
    let spec = CommandDef::new("cp")
        .with_option(OptionDef::flag("recursive").with_short('r'))
        .with_option(OptionDef::flag("preserve"))
        .with_option(OptionDef::flag("preserve-links"))
        .with_positional(PositionalDef::new("sources", Arity::at_least(1)))
        .with_positional(PositionalDef::required("dest"))
        .build()
        .expect("demo spec is valid");
    let config = ParserConfig::builder()
        .allow_abbreviations(true)
        .build()
        .expect("demo config is valid");
    let parser = Parser::new(&spec, &config).expect("demo spec fits the config");

    let attempts: &[&[&str]] = &[
        &["-r", "a", "b", "out/"],
        &["--pres", "a", "out/"],
        &["-r", "out/"],
        &["-rx", "a", "out/"],
    ];

    for args in attempts {
        println!("$ cp {}", args.join(" "));
        match parser.parse(args.iter().copied()) {
            Ok(result) => {
                let json = serde_json::to_string(&result).expect("result serializes");
                println!("  ok: {json}");
            }
            Err(err) => {
                println!("  error: {}", err.kind);
                println!("  at index {} ({:?})", err.index, err.token());
            }
        }
    }
}
