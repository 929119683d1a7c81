use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use markdown_dynamic_config::Config;
use markdown_dynamic_engine::Markdown;
use markdown_dynamic_lua::{DirFs, Dynamic, Extension};

mod logging;

fn main() {
    logging::init("markdown_dynamic=info");
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut config_path: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(
                    args.next().context("--config needs a path")?,
                ));
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument: {other}"),
        }
    }
    let Some(input) = input else {
        print_usage();
        process::exit(2);
    };

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let mut builder = Markdown::builder();
    if let Some(config) = config {
        let script_dir = config
            .script_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        tracing::debug!(dir = %script_dir.display(), "resolving extension scripts");
        let extensions: Vec<Extension> = config
            .extensions
            .iter()
            .map(|e| Extension::new(e.file.clone()).with_options(e.options.clone()))
            .collect();
        let dynamic = Dynamic::new()
            .with_fs(DirFs::new(script_dir))
            .with_extensions(extensions)
            .with_on_error(|err| tracing::error!(%err, "extension fault"));
        builder = builder.extension(&dynamic);
    }
    let md = builder.build();

    let source = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    print!("{}", md.convert(&source));
    Ok(())
}

fn print_usage() {
    eprintln!("usage: markdown-dynamic [--config <config.toml>] <input.md>");
}
