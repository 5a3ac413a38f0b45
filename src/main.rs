//! # imagesearch CLI
//!
//! ## Usage
//! ```bash
//! imagesearch search ref.jpg ~/Photos --threshold 10 --format text
//! imagesearch dupe ~/Photos --algorithm phash -p hash_size=16
//! imagesearch algorithms
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
