//! Expand `@file` arguments, including nested files and the `@@` escape.
//!
//! Run with: `cargo run -p argtree-demos --example argfiles`

use std::fs;

use argtree_core::{ArgFileFormat, ParserConfig};
use argtree_parser::expand_args;

fn main() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let inner = dir.path().join("inner.txt");
    let outer = dir.path().join("outer.sh");
    fs::write(&inner, "--from-inner\n").expect("write inner file");
    fs::write(
        &outer,
        format!("--name 'two words' # comment\n@{}\n", inner.display()),
    )
    .expect("write outer file");

    let config = ParserConfig::builder()
        .argfile_format(ArgFileFormat::Shell)
        .max_argfile_depth(2)
        .build()
        .expect("demo config is valid");

    let args = vec![
        "-v".to_string(),
        format!("@{}", outer.display()),
        "@@literal".to_string(),
    ];
    println!("Given:    {args:?}");

    match expand_args(&args, &config) {
        Ok(expanded) => println!("Expanded: {expanded:?}"),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
