use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gridfarm_client::{ClientConfig, Network};

#[derive(Parser, Debug)]
#[command(
    name = "gridfarm",
    version,
    about = "Register identities and farms on the grid explorer"
)]
pub struct Cli {
    /// Well-known explorer to talk to
    #[arg(long, global = true, env = "GRIDFARM_NETWORK", conflicts_with = "url")]
    pub network: Option<Network>,

    /// Explorer base URL (overrides GRIDFARM_EXPLORER_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Seed file (default: <config dir>/tffarmer.seed)
    #[arg(long, global = true, env = "GRIDFARM_SEED")]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    /// Client config from the environment, then the network or url flags.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(network) = self.network {
            config = config.with_url(network.url());
        }
        if let Some(url) = &self.url {
            config = config.with_url(url.clone());
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the local identity and its phonebook record
    Identity(IdentityArgs),
    /// Register, update and inspect farms
    Farm(FarmArgs),
    /// Inspect nodes
    Node(NodeArgs),
    /// Sign a payload with the local identity
    Sign(SignArgs),
}

#[derive(Args, Debug)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub cmd: IdentitySub,
}

#[derive(Subcommand, Debug)]
pub enum IdentitySub {
    /// Register the identity (creating or restoring a key) and save the seed
    Register {
        /// 3bot name, e.g. alice.3bot
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Restore the key from these seed words instead of the seed file
        #[arg(long)]
        words: Option<String>,
    },
    /// Print the local identity and its phonebook record
    Show {
        /// Also print the seed words
        #[arg(long)]
        words: bool,
    },
}

#[derive(Args, Debug)]
pub struct FarmArgs {
    #[command(subcommand)]
    pub cmd: FarmSub,
}

#[derive(Subcommand, Debug)]
pub enum FarmSub {
    /// Register a new farm owned by the local identity
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// TFT wallet address receiving farming rewards
        #[arg(long)]
        wallet: String,
    },
    /// Replace name, email and wallet of a farm
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        wallet: String,
    },
    /// List farms (default: the local identity's farms)
    List {
        /// Owner threebot id
        #[arg(long)]
        owner: Option<i64>,
        /// Exact farm name
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = gridfarm_client::session::SCAN_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show one farm as JSON
    Get { id: i64 },
}

#[derive(Args, Debug)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub cmd: NodeSub,
}

#[derive(Subcommand, Debug)]
pub enum NodeSub {
    /// List the nodes of a farm
    List {
        #[arg(long)]
        farm: i64,
        #[arg(long, default_value_t = gridfarm_client::session::SCAN_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show one node as JSON
    Get {
        node_id: String,
        /// Include hardware proofs
        #[arg(long)]
        proofs: bool,
    },
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Payload arguments, in order. JSON strings, numbers and null are taken
    /// as JSON; anything else as a plain string.
    #[arg(required = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn network_and_url_conflict() {
        let err = Cli::try_parse_from([
            "gridfarm",
            "--network",
            "testnet",
            "--url",
            "http://localhost",
            "farm",
            "get",
            "1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn network_selects_explorer_url() {
        let cli = Cli::try_parse_from(["gridfarm", "farm", "get", "1", "--network", "devnet"]).unwrap();
        assert_eq!(cli.network, Some(Network::Devnet));
        assert_eq!(cli.client_config().url, Network::Devnet.url());
    }

    #[test]
    fn sign_collects_arguments_in_order() {
        let cli = Cli::try_parse_from(["gridfarm", "sign", "farm", "42", "1.5"]).unwrap();
        match cli.cmd {
            Command::Sign(args) => assert_eq!(args.args, vec!["farm", "42", "1.5"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
