//! `gridfarm identity` - register and inspect the local identity.

use std::path::Path;

use anyhow::{Context, Result};
use gridfarm_client::{ClientConfig, Session, UserIdentity};
use tracing::info;

use crate::args::IdentitySub;
use crate::seed;

pub fn run(cmd: IdentitySub, config: &ClientConfig, seed_path: &Path) -> Result<()> {
    match cmd {
        IdentitySub::Register { name, email, words } => {
            register(config, seed_path, &name, &email, words.as_deref())
        }
        IdentitySub::Show { words } => show(config, seed_path, words),
    }
}

fn register(
    config: &ClientConfig,
    seed_path: &Path,
    name: &str,
    email: &str,
    words: Option<&str>,
) -> Result<()> {
    let identity = match words {
        Some(words) => seed::identity_from_mnemonic(words, 0)?,
        None if seed_path.exists() => seed::load(seed_path)?,
        None => {
            info!("no seed file found, generating a new key");
            UserIdentity::generate()
        }
    };

    let session = Session::open(config, identity)?;
    let registration = session
        .register_identity(name, email)
        .context("failed to register user")?;

    seed::save(seed_path, &registration.identity).context("failed to save seed")?;

    if registration.created {
        println!("Registered {} with id {}", registration.user.name, registration.user.id);
    } else {
        println!(
            "{} is already registered with this key, id {}",
            registration.user.name, registration.user.id
        );
    }
    println!(
        "Seed saved in {}. Make sure you have it backed up.",
        seed_path.display()
    );
    Ok(())
}

fn show(config: &ClientConfig, seed_path: &Path, words: bool) -> Result<()> {
    let identity = seed::load(seed_path)?;

    println!("seed file:  {}", seed_path.display());
    println!("threebot id: {}", identity.threebot_id());
    println!("public key: {}", identity.public_key_hex());
    if words {
        println!("words:      {}", seed::mnemonic(&identity)?);
    }

    if identity.threebot_id() <= 0 {
        println!("not registered");
        return Ok(());
    }

    let session = Session::open(config, identity)?;
    let user = session
        .client()
        .phonebook()
        .get(session.threebot_id())
        .context("failed to fetch phonebook record")?;
    println!("name:       {}", user.name);
    println!("email:      {}", user.email);
    if !user.has_public_key(session.identity()) {
        eprintln!("warning: the phonebook record carries a different public key");
    }
    Ok(())
}
