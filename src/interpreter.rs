//! Tree‑walking evaluator.
//!
//! Statements execute against a chain of [`Environment`]s rooted in a
//! per‑interpreter global scope.  Locals are read through the distances the
//! resolver recorded (keyed by [`ExprId`]); anything without an entry is a
//! global and is looked up by name.
//!
//! `return` travels as [`Flow::Return`] on the success path of statement
//! execution, so only genuine failures use the error channel.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, ExprVisitor, FunctionDecl, LiteralValue, Stmt, StmtVisitor};
use crate::callable::{LoxFunction, NativeFunction, INITIALIZER};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Default bound on nested calls before [`LoxError::StackOverflow`].
pub const DEFAULT_MAX_DEPTH: usize = 2048;

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    /// Fell through; continue with the next statement.
    Next,

    /// A `return` is unwinding to the nearest call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    depth: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` statements write to `out`.  Native
    /// functions such as `clock` are defined here.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        debug!("Defining native function 'clock'");

        globals
            .borrow_mut()
            .define("clock", Value::NativeFunction(Rc::new(NativeFunction::clock())));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Change the nested‑call limit.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Record that `id` refers to a binding `depth` scopes out.  Called by the
    /// resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Resolved distance of `id`, `None` for globals.
    pub fn local_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the run; output already written stays written.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = statements
            .iter()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        // A failed run must not leave the session inside a nested scope.
        self.environment = Rc::clone(&self.globals);
        self.depth = 0;
        self.out.flush()?;

        if result.is_ok() {
            info!("Interpretation completed successfully");
        }

        result
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| stmt.accept(self))
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| expr.accept(self))
    }

    /// Run `statements` with `environment` as the current scope, restoring the
    /// previous scope afterwards whether or not they succeed.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Next)
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call_value(&mut self, callee: Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.depth >= self.max_depth {
            return Err(LoxError::StackOverflow {
                depth: self.max_depth,
                line: paren.line,
            });
        }

        debug!("Calling {} at depth {}", callee, self.depth);

        self.depth += 1;
        let result = ensure_sufficient_stack(|| callable.call(self, arguments));
        self.depth -= 1;

        result
    }

    fn define_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let culprit: &Token = match expr {
                        Expr::Variable { name: super_name, .. } => super_name,
                        _ => name,
                    };

                    return Err(LoxError::runtime(culprit, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over a scope holding `super`.
        let enclosing: EnvRef = Rc::clone(&self.environment);
        let method_env: EnvRef = match &superclass {
            Some(class) => {
                let mut env = Environment::with_enclosing(Rc::clone(&enclosing));
                env.define("super", Value::Class(Rc::clone(class)));
                env.into_ref()
            }
            None => Rc::clone(&enclosing),
        };

        let methods: HashMap<String, LoxFunction> = methods
            .iter()
            .map(|decl| {
                let is_initializer = decl.name.lexeme == INITIALIZER;
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&method_env), is_initializer);

                (decl.name.lexeme.clone(), function)
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);

        info!("Class '{}' defined", name.lexeme);

        let result = enclosing
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)));

        result
    }

    fn super_method(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = self.locals.get(&id).copied().ok_or_else(|| {
            LoxError::runtime(keyword, "Cannot use 'super' outside of a class.")
        })?;

        let superclass = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Class(class) => class,
            _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.")),
        };

        // `this` lives in the scope just inside the one holding `super`.
        let this_token = Token::new(TokenType::THIS, "this", keyword.line);
        let object: Value =
            Environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)?;

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }
}

// ───────────────────────────── statements ──────────────────────────────────

impl StmtVisitor<Result<Flow>> for Interpreter {
    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        debug!("Executing statement: {:?}", stmt);

        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let env: EnvRef =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();

                return self.execute_block(statements, env);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                return Ok(Flow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.define_class(name, superclass.as_ref(), methods)?;
            }
        }

        Ok(Flow::Next)
    }
}

// ───────────────────────────── expressions ─────────────────────────────────

fn number_operand(operator: &Token, operand: &Value) -> Result<f64> {
    match operand {
        Value::Number(n) => Ok(*n),
        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}

impl ExprVisitor<Result<Value>> for Interpreter {
    fn visit_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(-number_operand(operator, &right)?)),
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::PLUS => match (left, right) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                        _ => Err(LoxError::runtime(
                            operator,
                            "Operands must be two numbers or two strings.",
                        )),
                    },

                    TokenType::MINUS => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Number(a - b))
                    }

                    TokenType::STAR => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Number(a * b))
                    }

                    // Division by zero yields NaN rather than an error.
                    TokenType::SLASH => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Number(if b == 0.0 { f64::NAN } else { a / b }))
                    }

                    TokenType::GREATER => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Bool(a > b))
                    }

                    TokenType::GREATER_EQUAL => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Bool(a >= b))
                    }

                    TokenType::LESS => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Bool(a < b))
                    }

                    TokenType::LESS_EQUAL => {
                        let (a, b) = number_operands(operator, &left, &right)?;
                        Ok(Value::Bool(a <= b))
                    }

                    TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

                    TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

                    _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
                }
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let arguments: Vec<Value> = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<_>>()?;

                self.call_value(callee, paren, arguments)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.super_method(*id, keyword, method),
        }
    }
}
