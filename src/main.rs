use clap::Parser;
use scalpcheck::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
