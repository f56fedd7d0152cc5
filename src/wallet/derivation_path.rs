//! Account Derivation Paths
//!
//! Every account lives at `m/44'/<coin>'/0'/<index>'`, hardened at each
//! segment. Paths parse from and format to that string form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PlutusError, PlutusResult};
use crate::types::Chain;

/// BIP-44 purpose
pub const PURPOSE: u32 = 44;

/// Account segment; the per-account index sits one level below it
pub const ACCOUNT_SEGMENT: u32 = 0;

/// Hardened offset for BIP-32 style indices
pub const HARDENED: u32 = 0x8000_0000;

/// Parsed account path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DerivationPath {
    chain: Chain,
    account_index: u32,
}

impl DerivationPath {
    pub fn new(chain: Chain, account_index: u32) -> PlutusResult<Self> {
        if account_index >= HARDENED {
            return Err(PlutusError::derivation(format!(
                "Account index {} exceeds the hardened range",
                account_index
            )));
        }
        Ok(Self { chain, account_index })
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn account_index(&self) -> u32 {
        self.account_index
    }

    /// Segment indices without the hardened bit, in path order
    pub fn hardened_indices(&self) -> [u32; 4] {
        [PURPOSE, self.chain.coin_type(), ACCOUNT_SEGMENT, self.account_index]
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in self.hardened_indices() {
            write!(f, "/{}'", index)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = PlutusError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();

        let rest = trimmed
            .strip_prefix("m/")
            .or_else(|| trimmed.strip_prefix("M/"))
            .ok_or_else(|| PlutusError::derivation("Derivation path must start with 'm/'"))?;

        let segments = rest
            .split('/')
            .map(parse_hardened_segment)
            .collect::<PlutusResult<Vec<u32>>>()?;

        let [purpose, coin_type, account, index] = segments[..] else {
            return Err(PlutusError::derivation(format!(
                "Expected 4 path segments, got {}",
                segments.len()
            )));
        };

        if purpose != PURPOSE || account != ACCOUNT_SEGMENT {
            return Err(PlutusError::derivation(format!(
                "Unsupported derivation path: {}",
                trimmed
            )));
        }

        let chain = Chain::from_coin_type(coin_type)?;
        DerivationPath::new(chain, index)
    }
}

/// Parse one segment; every segment must carry a hardened marker
fn parse_hardened_segment(segment: &str) -> PlutusResult<u32> {
    let segment = segment.trim();

    let number = segment
        .strip_suffix('\'')
        .or_else(|| segment.strip_suffix('h'))
        .or_else(|| segment.strip_suffix('H'))
        .ok_or_else(|| {
            PlutusError::derivation(format!("Path segment '{}' is not hardened", segment))
        })?;

    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(PlutusError::derivation(format!(
            "Invalid path segment: '{}'",
            segment
        )));
    }

    let index: u32 = number
        .parse()
        .map_err(|_| PlutusError::derivation(format!("Path index out of range: {}", number)))?;

    if index >= HARDENED {
        return Err(PlutusError::derivation(format!(
            "Path index {} exceeds the hardened range",
            index
        )));
    }

    Ok(index)
}

impl TryFrom<String> for DerivationPath {
    type Error = PlutusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DerivationPath> for String {
    fn from(path: DerivationPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_display() {
        let path = DerivationPath::new(Chain::Solana, 3).unwrap();
        assert_eq!(path.to_string(), "m/44'/501'/0'/3'");

        let path = DerivationPath::new(Chain::Ethereum, 0).unwrap();
        assert_eq!(path.to_string(), "m/44'/60'/0'/0'");
    }

    #[test]
    fn test_parse() {
        let path: DerivationPath = "m/44'/60'/0'/7'".parse().unwrap();
        assert_eq!(path.chain(), Chain::Ethereum);
        assert_eq!(path.account_index(), 7);

        let path: DerivationPath = "m/44h/501h/0h/2h".parse().unwrap();
        assert_eq!(path.to_string(), "m/44'/501'/0'/2'");
    }

    #[test]
    fn test_parse_errors() {
        assert!("44'/501'/0'/0'".parse::<DerivationPath>().is_err());
        assert!("m/44'/501'/0'/0".parse::<DerivationPath>().is_err());
        assert!("m/44'/501'/0'".parse::<DerivationPath>().is_err());
        assert!("m/49'/501'/0'/0'".parse::<DerivationPath>().is_err());
        assert!("m/44'/501'/0'/2147483648'".parse::<DerivationPath>().is_err());

        let err = "m/44'/0'/0'/0'".parse::<DerivationPath>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedChain);
    }

    #[test]
    fn test_index_limit() {
        let err = DerivationPath::new(Chain::Solana, HARDENED).unwrap_err();
        assert_eq!(err.code, ErrorCode::DerivationError);
        assert!(DerivationPath::new(Chain::Solana, HARDENED - 1).is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let path = DerivationPath::new(Chain::Solana, 1).unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"m/44'/501'/0'/1'\"");
        let back: DerivationPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
