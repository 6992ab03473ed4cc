//! A signed-in user: one client plus the identity it signs with.
//!
//! The session never swaps its identity. Registering returns the identity
//! carrying its explorer id; open a new session with it to act as that user.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::identity::{Identity, UserIdentity};
use crate::pager::{FarmFilter, NodeFilter};
use crate::phonebook::Phonebook;
use crate::types::{Farm, Node, User, WalletAddress};

/// Page size used for full farm and node scans.
pub const SCAN_PAGE_SIZE: u32 = 20;

/// Outcome of [`register_identity`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// The same key, now carrying the explorer id.
    pub identity: UserIdentity,
    /// False when an existing record with the same key was adopted.
    pub created: bool,
}

/// Register `identity` under `name` and `email`, or adopt an existing record
/// that already carries its public key.
pub fn register_identity(
    phonebook: &dyn Phonebook,
    identity: &UserIdentity,
    name: &str,
    email: &str,
) -> ClientResult<Registration> {
    let name = name.trim();
    let email = email.trim();
    let pubkey = identity.public_key_hex();

    match phonebook.find_by_name_or_email(name, email) {
        Ok(existing) if existing.has_public_key(identity) => {
            info!(id = existing.id, name = %existing.name, "user already registered with this key");
            return Ok(Registration {
                identity: identity.with_id(existing.id),
                user: existing,
                created: false,
            });
        }
        Ok(existing) => {
            return Err(ClientError::IdentityConflict {
                name: existing.name,
            });
        }
        Err(ClientError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    let mut user = User {
        name: name.to_string(),
        email: email.to_string(),
        pubkey,
        ..Default::default()
    };
    user.id = phonebook.create(&user)?;
    info!(id = user.id, name = %user.name, "registered user");

    Ok(Registration {
        identity: identity.with_id(user.id),
        user,
        created: true,
    })
}

/// Client bound to one user identity.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    identity: Arc<UserIdentity>,
}

impl Session {
    /// Connect with every request signed by `identity`.
    pub fn open(config: &ClientConfig, identity: UserIdentity) -> ClientResult<Self> {
        let identity = Arc::new(identity);
        let signer: Arc<dyn Identity> = identity.clone();
        let client = Client::new(config, Some(signer))?;
        Ok(Self { client, identity })
    }

    /// Session over an existing client.
    pub fn with_client(client: Client, identity: UserIdentity) -> Self {
        Self {
            client,
            identity: Arc::new(identity),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn threebot_id(&self) -> i64 {
        self.identity.threebot_id()
    }

    /// See [`register_identity`].
    pub fn register_identity(&self, name: &str, email: &str) -> ClientResult<Registration> {
        register_identity(self.client.phonebook(), &self.identity, name, email)
    }

    /// Register a farm owned by this user; returns it with its new id.
    pub fn register_farm(&self, name: &str, email: &str, wallet: &str) -> ClientResult<Farm> {
        let mut farm = self.farm_record(0, name, email, wallet)?;
        farm.id = self.client.directory().farm_register(&farm)?;
        info!(id = farm.id, name = %farm.name, "registered farm");
        Ok(farm)
    }

    /// Replace name, email and wallet of one of this user's farms.
    pub fn update_farm(&self, id: i64, name: &str, email: &str, wallet: &str) -> ClientResult<Farm> {
        let farm = self.farm_record(id, name, email, wallet)?;
        self.client.directory().farm_update(&farm)?;
        info!(id, name = %farm.name, "updated farm");
        Ok(farm)
    }

    /// Every farm owned by this user.
    pub fn my_farms(&self) -> ClientResult<Vec<Farm>> {
        let owner = self.registered_id()?;
        let farms = self
            .client
            .directory()
            .farms(FarmFilter::default().owned_by(owner), SCAN_PAGE_SIZE)
            .collect::<ClientResult<Vec<_>>>()?;
        debug!(owner, count = farms.len(), "listed farms");
        Ok(farms)
    }

    /// Every node in a farm.
    pub fn farm_nodes(&self, farm_id: i64) -> ClientResult<Vec<Node>> {
        self.client
            .directory()
            .nodes(NodeFilter::default().in_farm(farm_id), SCAN_PAGE_SIZE)
            .collect()
    }

    fn registered_id(&self) -> ClientResult<i64> {
        match self.identity.threebot_id() {
            id if id > 0 => Ok(id),
            _ => Err(ClientError::InvalidRequest {
                message: "identity is not registered in the phonebook".into(),
            }),
        }
    }

    fn farm_record(&self, id: i64, name: &str, email: &str, wallet: &str) -> ClientResult<Farm> {
        Ok(Farm {
            id,
            threebot_id: self.registered_id()?,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            wallet_addresses: vec![WalletAddress::tft(wallet.trim())],
            ..Default::default()
        })
    }
}
