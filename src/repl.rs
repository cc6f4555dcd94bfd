use crate::environment::Environment;
use crate::evaluator;
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::{ParseError, Parser};
use custom_error::custom_error;
use std::io::{self, BufRead, Write};
use tracing::debug;

static PROMPT: &str = ">> ";

static MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

custom_error! {
    pub ReplError

    Io{source: io::Error} = "i/o error: {source}",
}

/// Interactive session on stdin/stdout.
pub fn start() -> Result<(), ReplError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(stdin.lock(), stdout.lock())
}

/// Reads one line at a time until end of input or `exit`. Every line is
/// evaluated against the same environment, so bindings carry over.
pub fn run<R: BufRead, W: Write>(input: R, mut output: W) -> Result<(), ReplError> {
    let env = Environment::new();
    let mut lines = input.lines();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(()),
        };

        if line.trim() == "exit" {
            return Ok(());
        }

        eval_source(&line, &env, &mut output)?;
    }
}

/// Runs a whole source file in a fresh environment.
pub fn run_source<W: Write>(source: &str, mut output: W) -> Result<(), ReplError> {
    let env = Environment::new();
    eval_source(source, &env, &mut output)?;
    Ok(())
}

fn eval_source<W: Write>(source: &str, env: &Environment, output: &mut W) -> io::Result<()> {
    match Parser::new(Lexer::new(source.to_owned())).parse_program() {
        Err(errors) => print_parser_errors(output, &errors),
        Ok(program) => match evaluator::eval(&program, env) {
            Ok(Object::Null) => Ok(()),
            Ok(val) => writeln!(output, "{}", val),
            Err(err) => {
                debug!(%err, "evaluation failed");
                writeln!(output, "ERROR: {}", err)
            }
        },
    }
}

fn print_parser_errors<W: Write>(output: &mut W, errors: &[ParseError]) -> io::Result<()> {
    write!(output, "{}", MONKEY_FACE)?;
    writeln!(output, "Looks like we ran into some monkey business here...")?;
    writeln!(output, "parser errors:")?;
    for err in errors.iter() {
        writeln!(output, "\t{}", err)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn session(input: &str) -> String {
        let mut output = vec![];
        run(Cursor::new(input.to_owned()), &mut output).expect("session failed");
        String::from_utf8(output).expect("output is utf-8")
    }

    #[test]
    fn test_bindings_persist_across_lines() {
        assert_eq!(
            session("let a = 5;\nlet b = a * 2;\nb + 1\n"),
            ">> >> >> 11\n>> "
        );
    }

    #[test]
    fn test_functions_persist_across_lines() {
        assert_eq!(
            session("let add = fn(a, b) { a + b };\nadd(2, 3);\n"),
            ">> >> 5\n>> "
        );
    }

    #[test]
    fn test_inspection_output() {
        assert_eq!(
            session("true\n\"hi\"\nfn(x) { x * 2 }\nlen\nif (false) { 1 }\n"),
            ">> true\n>> hi\n>> fn(x) { (x * 2) }\n>> builtin function\n>> >> "
        );
    }

    #[test]
    fn test_evaluation_errors_are_printed() {
        assert_eq!(
            session("5 + true;\nx\n"),
            ">> ERROR: type mismatch: INTEGER + BOOLEAN\n>> ERROR: identifier not found: x\n>> "
        );
    }

    #[test]
    fn test_parse_errors_skip_evaluation() {
        let output = session("let x = 1;\nlet x 5;\nx\n");

        assert!(output.contains("parser errors:\n\texpected next token to be Assign, got Int instead\n"));
        assert!(output.ends_with(">> 1\n>> "));
    }

    #[test]
    fn test_exit_ends_session() {
        assert_eq!(session("1\nexit\n2\n"), ">> 1\n>> ");
    }

    #[test]
    fn test_run_source() {
        let mut output = vec![];
        run_source(
            "let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } };\nfib(10)",
            &mut output,
        )
        .expect("run failed");

        assert_eq!(String::from_utf8(output).expect("utf-8"), "55\n");
    }
}
