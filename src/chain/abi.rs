use crate::error::{BadgeError, Result};
use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// The badge contract ABI is exactly these two functions
pub const MINT_TO_SIGNATURE: &str = "mintTo(address)";
pub const OWNER_SIGNATURE: &str = "owner()";

static MINT_TO_SELECTOR: Lazy<[u8; 4]> = Lazy::new(|| selector(MINT_TO_SIGNATURE));
static OWNER_SELECTOR: Lazy<[u8; 4]> = Lazy::new(|| selector(OWNER_SIGNATURE));

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First four bytes of the keccak hash of a canonical function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The address as a left-padded 32-byte ABI word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl FromStr for Address {
    type Err = BadgeError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 40 {
            return Err(BadgeError::InvalidAddress(value.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| BadgeError::InvalidAddress(value.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Calldata for `mintTo(address to)`
pub fn encode_mint_to(to: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&*MINT_TO_SELECTOR);
    data.extend_from_slice(&to.to_word());
    data
}

/// Calldata for `owner()`
pub fn encode_owner() -> Vec<u8> {
    OWNER_SELECTOR.to_vec()
}

/// Decode a single `address` return value
pub fn decode_address(output: &[u8]) -> Result<Address> {
    if output.len() < 32 {
        return Err(BadgeError::RpcResponse(format!(
            "expected a 32-byte address word, got {} bytes",
            output.len()
        )));
    }
    let word = &output[..32];
    if word[..12].iter().any(|b| *b != 0) {
        return Err(BadgeError::RpcResponse("address word has non-zero padding".to_string()));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_well_known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        assert_eq!(hex::encode(selector(OWNER_SIGNATURE)), "8da5cb5b");
    }

    #[test]
    fn test_address_parsing() {
        let addr: Address = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse().unwrap();
        assert_eq!(addr.to_string(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");

        let bare: Address = "7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(bare, addr);

        assert!("0x1234".parse::<Address>().is_err());
        assert!("not an address".parse::<Address>().is_err());
        assert!("0xzz5f4552091a69125d5dfcb7b8c2659029395bdf".parse::<Address>().is_err());
    }

    #[test]
    fn test_mint_to_calldata_layout() {
        let to: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let data = encode_mint_to(&to);
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &selector(MINT_TO_SIGNATURE));
        assert!(data[4..35].iter().all(|b| *b == 0));
        assert_eq!(data[35], 0xff);
    }

    #[test]
    fn test_decode_owner_word() {
        let owner: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(decode_address(&owner.to_word()).unwrap(), owner);
        assert!(decode_address(&[0u8; 20]).is_err());
        assert!(decode_address(&[0xffu8; 32]).is_err());
        assert_eq!(encode_owner(), vec![0x8d, 0xa5, 0xcb, 0x5b]);
    }
}
