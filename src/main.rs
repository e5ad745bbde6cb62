use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::interpreter::DEFAULT_MAX_DEPTH;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::{ErrorCategory, Lox, LoxError};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// Without a command an interactive prompt is started
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum number of nested calls before a stack overflow is reported
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token instead of text
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints the AST of every statement
    Parse { filename: PathBuf },
}

/// Exit status for a failed run.
fn exit_code(error: &LoxError) -> u8 {
    match error.category() {
        ErrorCategory::Static => 65,
        ErrorCategory::Runtime | ErrorCategory::Fatal => 70,
        ErrorCategory::Io => 74,
    }
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<u8> {
    let mut stdout = io::stdout().lock();
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    serde_json::to_writer(&mut stdout, &token)?;
                    writeln!(stdout)?;
                } else {
                    writeln!(stdout, "{}", token)?;
                }
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");

        return Ok(65);
    }

    info!("Tokenization completed successfully");
    Ok(0)
}

fn parse(source: &str) -> u8 {
    let (tokens, mut errors) = scan_tokens(source);
    let mut parser = Parser::new(tokens);
    let statements = parser.parse();

    errors.extend(parser.take_errors());
    if !errors.is_empty() {
        let e = LoxError::Compile(errors);

        debug!("Parse debug: {}", e);
        eprintln!("{}", e);
        return exit_code(&e);
    }

    for stmt in statements.iter().flatten() {
        let ast_str = AstPrinter::print_stmt(stmt);

        debug!("AST: {}", ast_str);
        println!("{}", ast_str);
    }

    info!("Parse subcommand completed");
    0
}

fn run(source: &str, max_depth: usize) -> u8 {
    let mut lox = Lox::new();
    lox.set_max_depth(max_depth);

    match lox.run(source) {
        Ok(()) => {
            info!("Program executed successfully");
            0
        }

        Err(e) => {
            debug!("Run debug: {}", e);
            eprintln!("{}", e);
            exit_code(&e)
        }
    }
}

fn repl(max_depth: usize) -> Result<u8> {
    info!("Starting REPL");

    let mut lox = Lox::new();
    lox.set_max_depth(max_depth);

    lox.run_prompt(io::stdin().lock(), io::stdout(), io::stderr())?;

    info!("REPL finished");
    Ok(0)
}

fn try_main(args: Cli) -> Result<u8> {
    match args.commands {
        Some(Commands::Run { filename }) => {
            info!("Running Run subcommand");
            let source = read_file(&filename)?;

            Ok(run(&source, args.max_depth))
        }

        Some(Commands::Tokenize { filename, json }) => {
            info!("Running Tokenize subcommand");
            let source = read_file(&filename)?;

            tokenize(&source, json)
        }

        Some(Commands::Parse { filename }) => {
            info!("Running Parse subcommand");
            let source = read_file(&filename)?;

            Ok(parse(&source))
        }

        None => repl(args.max_depth),
    }
}

fn main() -> ExitCode {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        if let Err(e) = init_logger() {
            eprintln!("{:#}", e);
            return ExitCode::from(74);
        }
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match try_main(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(74)
        }
    }
}
