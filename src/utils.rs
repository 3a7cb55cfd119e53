//! Format checks and numeric normalization shared by the client
//!
//! The checks are purely syntactic: they do not decode addresses or verify
//! checksums.

use regex::Regex;
use std::sync::OnceLock;

static URL_RE: OnceLock<Regex> = OnceLock::new();
static ASSET_ID_RE: OnceLock<Regex> = OnceLock::new();
static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
static TXID_RE: OnceLock<Regex> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("valid regex"))
}

/// Format validators exposed to callers
pub struct Utils;

impl Utils {
    /// `http`, `https` or `ftp` scheme followed by a host-like word
    pub fn is_url(url: &str) -> bool {
        pattern(&URL_RE, r"^(http|ftp|https)://[\w\-_]+").is_match(url)
    }

    /// 64 lowercase hex characters
    pub fn is_asset_id(id: &str) -> bool {
        pattern(&ASSET_ID_RE, r"^[0-9a-f]{64}$").is_match(id)
    }

    /// `bc1p`, `bcrt` or `tb1q` prefix followed by 38 to 40 base58-like characters
    pub fn is_valid_bitcoin_address(address: &str) -> bool {
        pattern(&ADDRESS_RE, r"^(bc1p|bcrt|tb1q)[a-zA-HJ-NP-Z0-9]{38,40}$").is_match(address)
    }

    /// 64 hex characters, either case
    pub fn is_tx_id(txid: &str) -> bool {
        pattern(&TXID_RE, r"^[a-fA-F0-9]{64}$").is_match(txid)
    }
}

/// Floor `value` and raise it to at least `min`; a missing value becomes `min`
pub fn floor_at_least(value: Option<f64>, min: u64) -> u64 {
    match value {
        Some(v) if v.is_finite() => {
            let floored = v.floor();
            if floored < min as f64 {
                min
            } else {
                floored as u64
            }
        }
        Some(v) if v == f64::INFINITY => u64::MAX,
        _ => min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_id() {
        assert!(Utils::is_tx_id(&"a".repeat(64)));
        assert!(Utils::is_tx_id(&"AbC0".repeat(16)));
        assert!(!Utils::is_tx_id("xyz"));
        assert!(!Utils::is_tx_id(&"a".repeat(63)));
        assert!(!Utils::is_tx_id(&"g".repeat(64)));
    }

    #[test]
    fn test_asset_id_is_lowercase_only() {
        assert!(Utils::is_asset_id(&"0f".repeat(32)));
        assert!(!Utils::is_asset_id(&"0F".repeat(32)));
        assert!(!Utils::is_asset_id(&"0f".repeat(31)));
    }

    #[test]
    fn test_bitcoin_address() {
        let regtest = format!("bcrt1q{}", "q".repeat(38));
        assert_eq!(regtest.len(), 44);
        assert!(Utils::is_valid_bitcoin_address(&regtest));
        assert!(Utils::is_valid_bitcoin_address(&format!("bc1p{}", "5".repeat(40))));
        assert!(!Utils::is_valid_bitcoin_address("bcrt1q0000"));
        assert!(!Utils::is_valid_bitcoin_address(&format!("1abc{}", "q".repeat(38))));
        // 'I' and 'O' are excluded
        assert!(!Utils::is_valid_bitcoin_address(&format!("tb1q{}", "O".repeat(38))));
    }

    #[test]
    fn test_url() {
        assert!(Utils::is_url("https://example.com"));
        assert!(Utils::is_url("ftp://files"));
        assert!(!Utils::is_url("ws://example.com"));
        assert!(!Utils::is_url("example.com"));
    }

    #[test]
    fn test_floor_at_least() {
        assert_eq!(floor_at_least(Some(0.0), 1), 1);
        assert_eq!(floor_at_least(Some(3.0), 10), 10);
        assert_eq!(floor_at_least(Some(5.9), 1), 5);
        assert_eq!(floor_at_least(Some(50.0), 10), 50);
        assert_eq!(floor_at_least(Some(-4.0), 6), 6);
        assert_eq!(floor_at_least(Some(f64::NAN), 1), 1);
        assert_eq!(floor_at_least(None, 6), 6);
    }
}
