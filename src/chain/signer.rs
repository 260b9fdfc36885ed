use super::abi::{keccak256, Address};
use super::rlp::{self, Item};
use super::to_hex;
use crate::error::{BadgeError, Result};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::fmt;

const EIP1559_TX_TYPE: u8 = 0x02;

/// Deployer wallet holding the static signing key
pub struct Wallet {
    key: SigningKey,
    address: Address,
}

impl Wallet {
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let trimmed = private_key.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| BadgeError::Signing("private key must be 32 bytes of hex".to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| BadgeError::Signing("private key is not a valid secp256k1 scalar".to_string()))?;
        let address = address_of(&key);
        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign_transaction(&self, tx: &Eip1559Transaction) -> Result<SignedTransaction> {
        let signing_hash = tx.signing_hash();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&signing_hash)
            .map_err(|e| BadgeError::Signing(e.to_string()))?;

        let sig_bytes = signature.to_bytes();
        let (r, s) = sig_bytes.split_at(32);

        let mut fields = tx.fields();
        fields.push(Item::uint(u128::from(recovery_id.to_byte())));
        fields.push(Item::bytes(rlp::trim_leading_zeros(r)));
        fields.push(Item::bytes(rlp::trim_leading_zeros(s)));

        let mut raw = vec![EIP1559_TX_TYPE];
        raw.extend_from_slice(&rlp::encode_list(&fields));
        let hash = keccak256(&raw);
        Ok(SignedTransaction { raw, hash })
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address).finish()
    }
}

fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().as_affine().to_encoded_point(false);
    // Uncompressed SEC1 point: 0x04 || X || Y
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

/// Type 2 (EIP-1559) contract call with an empty access list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl Eip1559Transaction {
    fn fields(&self) -> Vec<Item> {
        vec![
            Item::uint(u128::from(self.chain_id)),
            Item::uint(u128::from(self.nonce)),
            Item::uint(self.max_priority_fee_per_gas),
            Item::uint(self.max_fee_per_gas),
            Item::uint(u128::from(self.gas_limit)),
            Item::bytes(self.to.as_bytes().to_vec()),
            Item::uint(self.value),
            Item::bytes(self.data.clone()),
            Item::List(vec![]),
        ]
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        let mut payload = vec![EIP1559_TX_TYPE];
        payload.extend_from_slice(&rlp::encode_list(&self.fields()));
        keccak256(&payload)
    }
}

#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: [u8; 32],
}

impl SignedTransaction {
    pub fn raw_hex(&self) -> String {
        to_hex(&self.raw)
    }

    pub fn hash_hex(&self) -> String {
        to_hex(&self.hash)
    }
}
