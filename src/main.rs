use monkey_treewalk::repl;
use std::{env, fs, io, process};
use tracing_subscriber::EnvFilter;

/// Tracing stays off unless `RUST_LOG` is set.
fn init_tracing() {
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }
}

fn main() {
    init_tracing();

    let result = match env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(source) => repl::run_source(&source, io::stdout()),
            Err(err) => {
                eprintln!("could not read {}: {}", path, err);
                process::exit(1);
            }
        },
        None => {
            println!("Hello! This is the Monkey programming language!");
            println!("Feel free to type in commands");
            repl::start()
        }
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}
