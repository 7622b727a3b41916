use microrm::commands::Cli;
use microrm::libs::messages::macros::is_debug_mode;
use microrm::msg_error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    if is_debug_mode() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("microrm=debug")))
            .with_target(false)
            .init();
    }

    match Cli::menu() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            msg_error!(format!("{:#}", error));
            ExitCode::FAILURE
        }
    }
}
