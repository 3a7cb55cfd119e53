//! Network parameters for the networks the wallet bridge understands
//!
//! This module maps a network identifier (`mainnet`, `testnet`, `regtest`)
//! to the chain parameters used when building addresses and signatures.
//! Unknown identifiers resolve to regtest rather than failing.

use bitcoin::Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message prefix shared by every supported network
pub const MESSAGE_PREFIX: &str = "\x18Bitcoin Signed Message:\n";

/// Network identifier as sent over the bridge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

impl NetworkType {
    /// Wire name of the network
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Regtest => "regtest",
        }
    }

    /// Lenient lookup: anything that is not mainnet or testnet is regtest
    pub fn resolve(name: &str) -> Self {
        match name {
            "mainnet" => NetworkType::Mainnet,
            "testnet" => NetworkType::Testnet,
            _ => NetworkType::Regtest,
        }
    }

    /// Chain parameters for this network
    pub fn params(&self) -> NetworkParams {
        match self {
            NetworkType::Mainnet => NetworkParams::mainnet(),
            NetworkType::Testnet => NetworkParams::testnet(),
            NetworkType::Regtest => NetworkParams::regtest(),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            "regtest" => Ok(NetworkType::Regtest),
            _ => Err(format!(
                "Unknown network: {}. Supported networks: mainnet, testnet, regtest",
                s
            )),
        }
    }
}

/// BIP32 extended key version bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bip32Versions {
    pub public: u32,
    pub private: u32,
}

/// Network parameters for address and signature encoding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    /// Prefix prepended to messages before signing
    pub message_prefix: String,
    /// Bech32 human readable part (e.g., "bc" for mainnet, "tb" for testnet)
    pub bech32: String,
    /// Extended key version bytes
    pub bip32: Bip32Versions,
    /// P2PKH address version byte
    pub pub_key_hash: u8,
    /// P2SH address version byte
    pub script_hash: u8,
    /// WIF private key version byte
    pub wif: u8,
    /// Matching rust-bitcoin network
    pub network: Network,
}

impl NetworkParams {
    /// Create network parameters for mainnet
    pub fn mainnet() -> Self {
        Self {
            message_prefix: MESSAGE_PREFIX.to_string(),
            bech32: String::from("bc"),
            bip32: Bip32Versions {
                public: 0x0488_b21e,
                private: 0x0488_ade4,
            },
            pub_key_hash: 0x00,
            script_hash: 0x05,
            wif: 0x80,
            network: Network::Bitcoin,
        }
    }

    /// Create network parameters for testnet
    pub fn testnet() -> Self {
        Self {
            message_prefix: MESSAGE_PREFIX.to_string(),
            bech32: String::from("tb"),
            bip32: Bip32Versions {
                public: 0x0435_87cf,
                private: 0x0435_8394,
            },
            pub_key_hash: 0x6f,
            script_hash: 0xc4,
            wif: 0xef,
            network: Network::Testnet,
        }
    }

    /// Create network parameters for regtest (testnet encoding, `bcrt` HRP)
    pub fn regtest() -> Self {
        Self {
            bech32: String::from("bcrt"),
            network: Network::Regtest,
            ..Self::testnet()
        }
    }
}

/// Resolve the parameters for a network name, falling back to regtest
pub fn get_networks(name: &str) -> NetworkParams {
    NetworkType::resolve(name).params()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_networks() {
        assert_eq!(get_networks("mainnet").bech32, "bc");
        assert_eq!(get_networks("testnet").bech32, "tb");
        assert_eq!(get_networks("regtest").bech32, "bcrt");
        assert_eq!(get_networks("mainnet").network, Network::Bitcoin);
    }

    #[test]
    fn test_unknown_network_falls_back_to_regtest() {
        assert_eq!(get_networks("signet"), NetworkParams::regtest());
        assert_eq!(get_networks(""), NetworkParams::regtest());
        assert_eq!(NetworkType::resolve("MAINNET"), NetworkType::Regtest);
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!("Testnet".parse::<NetworkType>(), Ok(NetworkType::Testnet));
        assert!("signet".parse::<NetworkType>().is_err());
    }

    #[test]
    fn test_regtest_shares_testnet_versions() {
        let regtest = NetworkParams::regtest();
        let testnet = NetworkParams::testnet();
        assert_eq!(regtest.pub_key_hash, testnet.pub_key_hash);
        assert_eq!(regtest.bip32, testnet.bip32);
        assert_ne!(regtest.bech32, testnet.bech32);
    }

    #[test]
    fn test_params_serialize_camel_case() {
        let value = serde_json::to_value(NetworkParams::mainnet()).unwrap();
        assert_eq!(value["pubKeyHash"], 0);
        assert_eq!(value["scriptHash"], 5);
        assert_eq!(value["bip32"]["public"], 0x0488_b21e_u32);
    }
}
