use monkey_treewalk::{evaluator::eval, Environment, Lexer, Parser};
use std::env;
use std::time::Instant;

static INPUT: &str = "let fibonacci = fn(x) {
if (x == 0) { 0
     } else {
       if (x == 1) {
         return 1;
       } else {
         fibonacci(x - 1) + fibonacci(x - 2);
       }
} };
   fibonacci(N);";

fn main() {
    let n: u32 = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(25);

    let program = match Parser::new(Lexer::new(INPUT.replace('N', &n.to_string()))).parse_program()
    {
        Ok(program) => program,
        Err(errors) => {
            for err in errors.iter() {
                eprintln!("\t{}", err);
            }
            return;
        }
    };

    let env = Environment::new();
    let start = Instant::now();
    let result = eval(&program, &env);
    let duration = start.elapsed();

    match result {
        Ok(value) => println!(
            "engine=eval, n={}, result={}, duration={}",
            n,
            value,
            duration.as_secs_f64(),
        ),
        Err(err) => println!("ERROR: {}", err),
    }
}
