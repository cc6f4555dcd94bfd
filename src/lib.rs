pub mod ast;
mod builtins;
mod environment;
pub mod evaluator;
mod lexer;
pub mod object;
mod parser;
pub mod repl;
mod stack;
pub mod token;

pub use environment::{Environment, FrameId};
pub use lexer::Lexer;
pub use object::{EvalError, Object};
pub use parser::{ParseError, Parser, Precedence};
