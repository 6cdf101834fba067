mod grammars;
mod render;

use anyhow::{Context, Result, bail};
use log::LevelFilter;
use ruleweave_config::Config;
use std::io::Read;
use std::{env, fs, io, process};

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    grammar: Option<String>,
    stream: bool,
    errors_only: bool,
    input: String,
}

enum Command {
    Parse(Options),
    Help,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [--grammar <name>] [--stream] [--errors-only] <file|->\n\
         Grammars: {}",
        grammars::NAMES.join(", ")
    )
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut options = Options::default();
    let mut input = None;
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--grammar" | "-g" => {
                let Some(name) = args.next() else {
                    bail!("--grammar requires a name");
                };
                options.grammar = Some(name.clone());
            }
            "--stream" => options.stream = true,
            "--errors-only" => options.errors_only = true,
            flag if flag.starts_with("--") => bail!("Unknown option {flag}"),
            path => {
                if input.replace(path.to_string()).is_some() {
                    bail!("Only one input may be given");
                }
            }
        }
    }
    let Some(input) = input else {
        bail!("No input given");
    };
    options.input = input;
    Ok(Command::Parse(options))
}

fn init_logging(config: &Config) {
    let level = match config.level_filter() {
        Ok(level) => level.unwrap_or(LevelFilter::Warn),
        Err(e) => {
            eprintln!("Warning: {e}");
            LevelFilter::Warn
        }
    };
    // RUST_LOG, when set, overrides the configured level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read standard input")?;
        return Ok(source);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

/// Parses the input and prints the result. Returns whether parsing succeeded.
fn run(options: &Options, config: &Config) -> Result<bool> {
    let grammar_name = options
        .grammar
        .as_deref()
        .unwrap_or(&config.default_grammar);
    let grammar = grammars::by_name(grammar_name)?;
    let source = read_input(&options.input)?;
    let origin = if options.input == "-" {
        "<stdin>"
    } else {
        options.input.as_str()
    };
    log::info!("parsing {origin} ({} bytes) as {grammar_name}", source.len());

    let errors = if options.stream {
        let mut stream = grammar.stream(&source);
        for node in stream.by_ref() {
            if !options.errors_only {
                println!("{}", render::line(&node, &source, config.show_spans));
            }
        }
        stream.errors().to_vec()
    } else {
        let outcome = grammar.parse(&source);
        if !options.errors_only {
            print!("{}", render::tree(&outcome.tree, &source, config.show_spans));
        }
        outcome.errors
    };

    for err in &errors {
        eprintln!("{}", render::error(err, &source, origin));
    }
    Ok(errors.is_empty())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("ruleweave", String::as_str);

    let options = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(Command::Parse(options)) => options,
        Ok(Command::Help) => {
            println!("{}", usage(program));
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", usage(program));
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Config file location: {}", Config::config_path().display());
            process::exit(1);
        }
    };
    init_logging(&config);
    log::debug!("config: {config:?}");

    match run(&options, &config) {
        Ok(true) => Ok(()),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
