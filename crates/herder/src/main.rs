use clap::Parser;
use herder::runtime::{boot, run};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let cli = run::Cli::parse();
    let code = run::run(cli)?;
    std::process::exit(code);
}
