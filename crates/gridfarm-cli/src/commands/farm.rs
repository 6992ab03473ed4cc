//! `gridfarm farm` - farm registration and listings.

use std::path::Path;

use anyhow::{Context, Result};
use gridfarm_client::{Client, ClientConfig, Farm, FarmFilter};

use super::open_session;
use crate::args::FarmSub;

pub fn run(cmd: FarmSub, config: &ClientConfig, seed_path: &Path) -> Result<()> {
    match cmd {
        FarmSub::Register {
            name,
            email,
            wallet,
        } => {
            let session = open_session(config, seed_path)?;
            let farm = session
                .register_farm(&name, &email, &wallet)
                .context("failed to register farm")?;
            println!("Registered farm {} with id {}", farm.name, farm.id);
            Ok(())
        }
        FarmSub::Update {
            id,
            name,
            email,
            wallet,
        } => {
            let session = open_session(config, seed_path)?;
            let farm = session
                .update_farm(id, &name, &email, &wallet)
                .with_context(|| format!("failed to update farm {id}"))?;
            println!("Updated farm {} ({})", farm.id, farm.name);
            Ok(())
        }
        FarmSub::List {
            owner,
            name,
            page_size,
        } => list(config, seed_path, owner, name, page_size),
        FarmSub::Get { id } => {
            let farm = Client::new(config, None)?.directory().farm_get(id)?;
            println!("{}", serde_json::to_string_pretty(&farm)?);
            Ok(())
        }
    }
}

fn list(
    config: &ClientConfig,
    seed_path: &Path,
    owner: Option<i64>,
    name: Option<String>,
    page_size: u32,
) -> Result<()> {
    let mut filter = FarmFilter::default();
    let client = match (owner, &name) {
        (Some(owner), _) => {
            filter = filter.owned_by(owner);
            Client::new(config, None)?
        }
        (None, Some(_)) => Client::new(config, None)?,
        (None, None) => {
            let session = open_session(config, seed_path)?;
            filter = filter.owned_by(session.threebot_id());
            session.client().clone()
        }
    };
    if let Some(name) = name {
        filter = filter.named(name);
    }

    let mut count = 0usize;
    for farm in client.directory().farms(filter, page_size) {
        println!("{}", farm_line(&farm?));
        count += 1;
    }
    if count == 0 {
        println!("no farms found");
    }
    Ok(())
}

fn farm_line(farm: &Farm) -> String {
    let wallet = farm
        .wallet_addresses
        .first()
        .map(|w| w.address.as_str())
        .unwrap_or("-");
    format!("{}\t{}\t{}\t{}", farm.id, farm.name, farm.email, wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfarm_client::WalletAddress;

    #[test]
    fn farm_line_shows_first_wallet() {
        let farm = Farm {
            id: 3,
            name: "freefarm".into(),
            email: "f@b.com".into(),
            wallet_addresses: vec![WalletAddress::tft("GABC")],
            ..Default::default()
        };
        assert_eq!(farm_line(&farm), "3\tfreefarm\tf@b.com\tGABC");
        assert_eq!(farm_line(&Farm::default()), "0\t\t\t-");
    }
}
