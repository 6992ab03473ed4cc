//! Command implementations. Each returns `anyhow::Result`; `main` maps
//! failures to exit codes.

pub mod farm;
pub mod identity;
pub mod node;
pub mod sign;

use std::path::Path;

use anyhow::{Context, Result};
use gridfarm_client::{ClientConfig, Session};

use crate::args::{Cli, Command};
use crate::seed;

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = cli.client_config();
    let seed_path = match &cli.seed {
        Some(path) => path.clone(),
        None => seed::default_path()?,
    };

    match cli.cmd {
        Command::Identity(args) => identity::run(args.cmd, &config, &seed_path),
        Command::Farm(args) => farm::run(args.cmd, &config, &seed_path),
        Command::Node(args) => node::run(args.cmd, &config),
        Command::Sign(args) => sign::run(args, &seed_path),
    }
}

/// Session for the identity stored in the seed file.
fn open_session(config: &ClientConfig, seed_path: &Path) -> Result<Session> {
    let identity = seed::load(seed_path)
        .context("no usable identity, run `gridfarm identity register` first")?;
    Ok(Session::open(config, identity)?)
}
