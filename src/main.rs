//! pipenv-pex - Generate Python executable files via pex using info from the Pipfile.
//!
//! This binary reads the project's locked dependencies, keeps excluded files
//! away from pex, and builds a single `.pex` archive.

use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match pipenv_pex::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
