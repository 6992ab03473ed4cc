//! Versioned seed file holding the user's identity key.
//!
//! The file starts with the JSON-quoted format version, directly followed by
//! the payload:
//!
//! - `"1.0.0"`: the raw 32-byte ed25519 seed
//! - `"1.1.0"`: `{"mnemonic": "<24 words>", "threebotid": <id>}`
//!
//! Files are always written in the latest format.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use bip39::{Language, Mnemonic};
use serde::{Deserialize, Serialize};

use gridfarm_client::UserIdentity;

pub const SEED_FILE_NAME: &str = "tffarmer.seed";

const VERSION_RAW: &str = "1.0.0";
const VERSION_MNEMONIC: &str = "1.1.0";

#[derive(Debug, Serialize, Deserialize)]
struct SeedData {
    mnemonic: String,
    threebotid: i64,
}

/// `<config dir>/tffarmer.seed`.
pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(SEED_FILE_NAME))
        .context("could not determine the user config directory")
}

/// BIP-39 English words encoding the identity's seed.
pub fn mnemonic(identity: &UserIdentity) -> Result<String> {
    let mnemonic = Mnemonic::from_entropy(&identity.seed(), Language::English)
        .map_err(|e| anyhow!("failed to encode seed as words: {e}"))?;
    Ok(mnemonic.phrase().to_string())
}

/// Identity restored from its seed words.
pub fn identity_from_mnemonic(words: &str, threebot_id: i64) -> Result<UserIdentity> {
    let words = words.split_whitespace().collect::<Vec<_>>().join(" ");
    let mnemonic = Mnemonic::from_phrase(&words, Language::English)
        .map_err(|e| anyhow!("invalid seed words: {e}"))?;
    Ok(UserIdentity::from_seed(mnemonic.entropy(), threebot_id)?)
}

pub fn load(path: &Path) -> Result<UserIdentity> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read seed file: {}", path.display()))?;

    let mut stream = serde_json::Deserializer::from_slice(&bytes).into_iter::<String>();
    let version = stream
        .next()
        .context("seed file is empty")?
        .context("seed file does not start with a version")?;
    let payload = &bytes[stream.byte_offset()..];

    match version.as_str() {
        VERSION_RAW => Ok(UserIdentity::from_seed(payload, 0)?),
        VERSION_MNEMONIC => {
            let data: SeedData =
                serde_json::from_slice(payload).context("failed to parse seed file payload")?;
            identity_from_mnemonic(&data.mnemonic, data.threebotid)
        }
        other => bail!("unsupported seed file version {other}"),
    }
}

/// Write the identity in the latest format, readable by the owner only.
pub fn save(path: &Path, identity: &UserIdentity) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory: {}", dir.display()))?;
    }

    let data = SeedData {
        mnemonic: mnemonic(identity)?,
        threebotid: identity.threebot_id(),
    };
    let mut content = serde_json::to_vec(VERSION_MNEMONIC)?;
    content.extend(serde_json::to_vec(&data)?);

    fs::write(path, &content)
        .with_context(|| format!("failed to write seed file: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on: {}", path.display()))?;
    }

    Ok(())
}
