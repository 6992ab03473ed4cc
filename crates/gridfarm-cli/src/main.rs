use clap::Parser;

mod args;
mod commands;
mod seed;

use args::Cli;
use gridfarm_client::ClientError;

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let cli = Cli::parse();
    let code = match commands::dispatch(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code(&e)
        }
    };
    std::process::exit(code);
}

/// Client errors keep their own grouping; anything else is a usage error.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ClientError>()
        .map_or(1, ClientError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_code_follows_wrapped_client_error() {
        let err: anyhow::Result<()> = Err(ClientError::RequestFailure {
            message: "connection refused".into(),
        })
        .context("failed to register farm");
        assert_eq!(exit_code(&err.unwrap_err()), 5);

        assert_eq!(exit_code(&anyhow::anyhow!("bad seed file")), 1);
    }
}
