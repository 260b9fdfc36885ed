//! Just enough Ethereum plumbing to call the badge contract: ABI encoding for
//! its two functions, RLP, EIP-1559 signing and a JSON-RPC client.

pub mod abi;
pub mod rlp;
pub mod rpc;
pub mod signer;

pub use abi::Address;
pub use rpc::{RpcClient, TransactionReceipt};
pub use signer::{Eip1559Transaction, SignedTransaction, Wallet};

use crate::error::{BadgeError, Result};

/// `0x`-prefixed lower-case hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without the `0x` prefix
pub fn from_hex(value: &str) -> Result<Vec<u8>> {
    let stripped = strip_0x(value);
    hex::decode(stripped).map_err(|e| BadgeError::RpcResponse(format!("invalid hex '{}': {}", value, e)))
}

/// Parse a JSON-RPC quantity such as `0x1a`
pub fn parse_quantity(value: &str) -> Result<u128> {
    let digits = strip_0x(value);
    if digits.is_empty() {
        return Err(BadgeError::RpcResponse(format!("empty quantity '{}'", value)));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| BadgeError::RpcResponse(format!("invalid quantity '{}': {}", value, e)))
}

/// Encode a JSON-RPC quantity (no leading zeros, `0x0` for zero)
pub fn quantity(value: u128) -> String {
    format!("{:#x}", value)
}

fn strip_0x(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
