use clap::{Parser as ClapParser, Subcommand};
use jmespath_lang::{
    Severity,
    cli::{self, CheckOptions, CheckResult, CliError, InferOptions, LintOptions},
    to_json, to_json_pretty,
};
use std::{
    io::{self, Read},
    sync::Once,
};

#[derive(ClapParser)]
#[command(name = "jmes")]
#[command(about = "jmes - evaluate JMESPath expressions and infer their result types")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against a JSON document
    Check {
        /// The JMESPath expression to evaluate
        expression: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// Infer the type of an expression's result
    Infer {
        /// The JMESPath expression to analyze
        expression: String,

        /// Sample JSON document describing the input (any input if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Fixed-point iteration limit for folds over arrays
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Report steps that always fail or always yield null
    Lint {
        /// The JMESPath expression to check
        expression: String,

        /// Sample JSON document describing the input (any input if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Print an expression in canonical form
    Fmt {
        /// The JMESPath expression to format
        expression: String,
    },
}

static TRACING_INIT: Once = Once::new();

/// Log to stderr, only when `RUST_LOG` asks for it.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            expression,
            input,
            pretty,
            syntax_only,
        } => run_check(expression, input, pretty, syntax_only),
        Commands::Infer {
            expression,
            input,
            max_iterations,
        } => run_infer(expression, input, max_iterations),
        Commands::Lint { expression, input } => run_lint(expression, input),
        Commands::Fmt { expression } => cli::execute_fmt(&expression).map(|text| println!("{text}")),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// The explicit argument, or stdin when something is piped in.
fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_check(expression: String, input: Option<String>, pretty: bool, syntax_only: bool) -> Result<(), CliError> {
    let input = if syntax_only { None } else { read_input(input)? };

    let options = CheckOptions {
        expression,
        input,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty { to_json_pretty(&output) } else { to_json(&output) };
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_infer(expression: String, sample: Option<String>, max_iterations: Option<usize>) -> Result<(), CliError> {
    let options = InferOptions {
        expression,
        sample: read_input(sample)?,
        max_iterations,
    };

    println!("{}", cli::execute_infer(&options)?);
    Ok(())
}

fn run_lint(expression: String, sample: Option<String>) -> Result<(), CliError> {
    let options = LintOptions {
        expression,
        sample: read_input(sample)?,
    };

    let problems = cli::execute_lint(&options)?;
    for problem in &problems {
        println!("{problem}");
    }
    if problems.iter().any(|p| p.severity == Severity::Error) {
        std::process::exit(1);
    }
    Ok(())
}
