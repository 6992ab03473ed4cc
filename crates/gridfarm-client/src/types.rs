//! Wire records exchanged with the explorer.
//!
//! Records carry no behavior; they mirror the JSON documents field for field.
//! Missing fields decode to defaults, and so do `null` collections, which the
//! explorer emits for empty lists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::UserIdentity;

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Currency a price is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PriceCurrency {
    #[default]
    Eur,
    Usd,
    Tft,
    Aed,
    Gbp,
}

impl TryFrom<u8> for PriceCurrency {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Eur),
            1 => Ok(Self::Usd),
            2 => Ok(Self::Tft),
            3 => Ok(Self::Aed),
            4 => Ok(Self::Gbp),
            other => Err(format!("unknown price currency {other}")),
        }
    }
}

impl From<PriceCurrency> for u8 {
    fn from(value: PriceCurrency) -> Self {
        value as u8
    }
}

impl fmt::Display for PriceCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Tft => "TFT",
            Self::Aed => "AED",
            Self::Gbp => "GBP",
        };
        f.write_str(name)
    }
}

/// Kind of the public interface of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IfaceType {
    #[default]
    Macvlan,
    Vlan,
}

impl TryFrom<u8> for IfaceType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Macvlan),
            1 => Ok(Self::Vlan),
            other => Err(format!("unknown interface type {other}")),
        }
    }
}

impl From<IfaceType> for u8 {
    fn from(value: IfaceType) -> Self {
        value as u8
    }
}

impl fmt::Display for IfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Macvlan => "macvlan",
            Self::Vlan => "vlan",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletAddress {
    pub asset: String,
    pub address: String,
}

impl WalletAddress {
    /// A TFT wallet address.
    pub fn tft(address: impl Into<String>) -> Self {
        Self {
            asset: "TFT".to_string(),
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub continent: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeResourcePrice {
    pub currency: PriceCurrency,
    pub cru: f64,
    pub mru: f64,
    pub hru: f64,
    pub sru: f64,
    pub nru: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIp {
    pub address: String,
    pub gateway: String,
    pub reservation_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeCloudUnitPrice {
    pub currency: PriceCurrency,
    pub cu: f64,
    pub su: f64,
    pub nu: f64,
    pub ipv4u: f64,
}

/// A farm as registered in the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Farm {
    pub id: i64,
    pub threebot_id: i64,
    pub iyo_organization: String,
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub wallet_addresses: Vec<WalletAddress>,
    pub location: Location,
    pub email: String,
    #[serde(deserialize_with = "null_default")]
    pub resource_prices: Vec<NodeResourcePrice>,
    pub prefix_zero: String,
    #[serde(rename = "ipaddresses", deserialize_with = "null_default")]
    pub ip_addresses: Vec<PublicIp>,
    pub enable_custom_pricing: bool,
    #[serde(rename = "farm_cloudunits_price")]
    pub farm_cloud_units_price: NodeCloudUnitPrice,
    /// Grid3 pricing enabled.
    pub is_grid3_compliant: bool,
}

/// A user record in the phonebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Hex encoded ed25519 public key.
    pub pubkey: String,
    pub host: String,
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub wallet_addresses: Vec<WalletAddress>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub signature: String,
    /// Trusted sales channel, only ever set by the foundation.
    #[serde(rename = "trusted_sales_channel")]
    pub is_trusted_channel: bool,
}

impl User {
    /// Whether this record was registered with the identity's public key.
    pub fn has_public_key(&self, identity: &UserIdentity) -> bool {
        self.pubkey == identity.public_key_hex()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceAmount {
    pub cru: u64,
    pub mru: f64,
    pub hru: f64,
    pub sru: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadAmount {
    pub network: u16,
    pub network_resource: u16,
    pub volume: u16,
    pub zdb_namespace: u16,
    pub container: u16,
    pub k8s_vm: u16,
    pub generic_vm: u16,
    pub proxy: u16,
    pub reverse_proxy: u16,
    pub subdomain: u16,
    pub delegate_domain: u16,
}

/// Hardware proof reported by a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Proof {
    pub created: String,
    pub hardware_hash: String,
    pub disk_hash: String,
    #[serde(deserialize_with = "null_default")]
    pub hardware: BTreeMap<String, serde_json::Value>,
    #[serde(deserialize_with = "null_default")]
    pub disks: BTreeMap<String, serde_json::Value>,
    #[serde(deserialize_with = "null_default")]
    pub hypervisor: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Iface {
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub addrs: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub gateway: Vec<String>,
    #[serde(rename = "macaddress")]
    pub mac_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIface {
    pub master: String,
    #[serde(rename = "type")]
    pub kind: IfaceType,
    pub ipv4: String,
    pub ipv6: String,
    pub gw4: String,
    pub gw6: String,
    pub version: i64,
}

/// A node as registered in the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: i64,
    pub node_id: String,
    #[serde(rename = "hostname")]
    pub host_name: String,
    pub node_id_v1: String,
    pub farm_id: i64,
    pub os_version: String,
    pub created: String,
    pub updated: String,
    pub uptime: i64,
    pub address: String,
    pub location: Location,
    pub total_resources: ResourceAmount,
    pub used_resources: ResourceAmount,
    pub reserved_resources: ResourceAmount,
    pub workloads: WorkloadAmount,
    #[serde(deserialize_with = "null_default")]
    pub proofs: Vec<Proof>,
    #[serde(deserialize_with = "null_default")]
    pub ifaces: Vec<Iface>,
    pub public_config: Option<PublicIface>,
    pub free_to_use: bool,
    pub approved: bool,
    pub public_key_hex: String,
    #[serde(deserialize_with = "null_default")]
    pub wg_ports: Vec<i64>,
    pub deleted: bool,
    pub reserved: bool,
}
