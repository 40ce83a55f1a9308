use darcy::problem::{run, DarcyConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(DarcyConfig::default()) {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!();
            eprintln!("----------------------------------------------------");
            eprintln!("Exception on processing:");
            eprintln!("{:?}", err);
            eprintln!("Aborting!");
            eprintln!("----------------------------------------------------");
            ExitCode::from(1)
        }
    }
}
