//! Binary entry point for tracestats.
//!
//! Kept deliberately empty of behavior: argument handling, pipeline wiring
//! and error reporting all live behind [`tracestats::cli::run`], which hands
//! back an exit code when something went wrong.

fn main() {
    // Everything user-visible has already been printed by run(); the only
    // job left here is turning its verdict into a process exit status.
    if let Err(code) = tracestats::cli::run() {
        std::process::exit(code.as_i32());
    }
}
