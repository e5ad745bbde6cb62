//! A tree‑walking interpreter for the Lox language.
//!
//! Source text flows through four stages:
//!
//! ```text
//! scanner → parser → resolver → interpreter
//! ```
//!
//! [`Lox`] strings them together for one session.  A session keeps its
//! interpreter (and so its globals) across calls to [`Lox::run`], which is
//! what the REPL relies on.

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stack;
pub mod token;
pub mod value;

use std::io::{BufRead, Write};

use log::{debug, info};

pub use error::{ErrorCategory, LoxError, Result};
pub use interpreter::Interpreter;
pub use value::Value;

use parser::Parser;
use resolver::Resolver;

/// One interpreter session.
pub struct Lox {
    interpreter: Interpreter,
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to standard output.
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
            next_id: 0,
        }
    }

    /// A session whose `print` statements write to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Lox {
            interpreter: Interpreter::with_output(out),
            next_id: 0,
        }
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.interpreter.set_max_depth(max_depth);
    }

    /// Scan, parse, resolve and execute `source`.
    ///
    /// Lexical and syntax errors are gathered together and returned as a
    /// single [`LoxError::Compile`]; nothing runs in that case, nor when the
    /// resolver rejects the program.  A runtime error stops execution at the
    /// failing statement.
    pub fn run(&mut self, source: &str) -> Result<()> {
        let (tokens, mut errors) = scanner::scan_tokens(source);

        let mut parser = Parser::new(tokens).with_first_id(self.next_id);
        let statements = parser.parse();
        self.next_id = parser.next_free_id();

        errors.extend(parser.take_errors());
        if !errors.is_empty() {
            info!("Run rejected with {} static error(s)", errors.len());

            return Err(LoxError::Compile(errors));
        }

        let statements: Vec<_> = statements.into_iter().flatten().collect();

        Resolver::new(&mut self.interpreter).resolve(&statements)?;

        self.interpreter.interpret(&statements)
    }

    /// Read‑eval‑print loop.  Each line of `input` is run in this session
    /// after writing a `> ` prompt to `prompt`.  Errors are reported to
    /// `errors` and the loop carries on; end of input ends it.
    pub fn run_prompt<R: BufRead, P: Write, E: Write>(
        &mut self,
        mut input: R,
        mut prompt: P,
        mut errors: E,
    ) -> Result<()> {
        loop {
            write!(prompt, "> ")?;
            prompt.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }

            if let Err(e) = self.run(&line) {
                debug!("REPL line failed: {}", e);

                writeln!(errors, "{}", e)?;
            }
        }

        writeln!(prompt)?;

        Ok(())
    }
}
