//! Parse a git-like command line.
//!
//! Run with: `cargo run -p argtree-demos --example git_like -- -vv commit -m "fix" -c user.name=me`

use argtree_core::*;
use argtree_parser::Parser;

fn main() {
    let spec = CommandDef::new("git")
        .with_option(
            OptionDef::flag("verbose")
                .with_short('v')
                .with_accumulation(Accumulation::Count),
        )
        .with_option(OptionDef::flag("color").with_negation_prefix("no-"))
        .with_subcommand(
            CommandDef::new("commit")
                .with_alias("ci")
                .with_option(OptionDef::value("message").with_short('m'))
                .with_option(OptionDef::flag("amend"))
                .with_option(OptionDef::dict("config").with_short('c')),
        )
        .with_subcommand(
            CommandDef::new("log")
                .with_option(OptionDef::value("max-count").with_short('n'))
                .with_positional(PositionalDef::new("paths", Arity::any())),
        )
        .build()
        .expect("demo spec is valid");

    let config = ParserConfig::builder()
        .allow_abbreviations(true)
        .build()
        .expect("demo config is valid");
    let parser = Parser::new(&spec, &config).expect("demo spec fits the config");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = if args.is_empty() {
        ["-vv", "--no-color", "ci", "--mess", "fix", "-c", "user.name=me", "-c", "core.editor=vim"]
            .map(String::from)
            .to_vec()
    } else {
        args
    };

    match parser.parse(args) {
        Ok(result) => {
            println!("Command path: {}", result.command_path().join(" "));
            println!("{}", serde_json::to_string_pretty(&result).expect("result serializes"));
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
