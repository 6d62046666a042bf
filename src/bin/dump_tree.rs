//! Print the lowered syntax snapshot for a C# file.
//!
//! `dump_tree <file.cs>` prints the arena outline the lints run on;
//! `dump_tree --raw <file.cs>` prints the tree-sitter S-expression instead.

use actor_clippy::parser::{lower, parse_source};
use anyhow::{Context, Result, bail};
use std::env;
use std::fs;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (raw, file_path) = match args.as_slice() {
        [flag, path] if flag == "--raw" => (true, path),
        [path] => (false, path),
        _ => bail!("Usage: dump_tree [--raw] <file.cs>"),
    };

    let source = fs::read_to_string(file_path)
        .with_context(|| format!("failed to read {file_path}"))?;
    let tree = parse_source(&source)?;

    println!("tree for {file_path}:");
    println!("================");
    if raw {
        println!("{}", tree.root_node().to_sexp());
    } else {
        print!("{}", lower(&tree, &source).render());
    }
    Ok(())
}
