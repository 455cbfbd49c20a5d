use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdout = io::stdout();
    match pgn_tally::cli::run(std::env::args().skip(1), &mut stdout.lock()) {
        Ok(code) => code,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                clap_err.exit();
            }
            eprintln!("pgn-tally: {err}");
            ExitCode::FAILURE
        }
    }
}
