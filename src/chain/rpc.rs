use super::abi::Address;
use super::{from_hex, parse_quantity, to_hex};
use crate::error::{BadgeError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Minimal JSON-RPC 2.0 client for an Ethereum node. One HTTP request per call.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: Option<String>,
    pub block_number: Option<String>,
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Post-Byzantium receipts report `0x0` for a reverted transaction
    pub fn reverted(&self) -> bool {
        self.status.as_deref() == Some("0x0")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockHeader {
    base_fee_per_gas: Option<String>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: RpcResponse = response.json().await?;

        if let Some(err) = parsed.error {
            return Err(BadgeError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        serde_json::from_value(parsed.result)
            .map_err(|e| BadgeError::RpcResponse(format!("{}: {}", method, e)))
    }

    async fn request_quantity(&self, method: &str, params: Value) -> Result<u128> {
        let raw: String = self.request(method, params).await?;
        parse_quantity(&raw)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let id = self.request_quantity("eth_chainId", json!([])).await?;
        u64::try_from(id).map_err(|_| BadgeError::RpcResponse(format!("chain id {} out of range", id)))
    }

    /// Nonce for the next transaction from `address`, counting pending ones
    pub async fn transaction_count(&self, address: &Address) -> Result<u64> {
        let count = self
            .request_quantity("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        u64::try_from(count).map_err(|_| BadgeError::RpcResponse(format!("nonce {} out of range", count)))
    }

    /// `baseFeePerGas` of the latest block; `None` on pre-London chains
    pub async fn latest_base_fee(&self) -> Result<Option<u128>> {
        let block: Option<BlockHeader> = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        match block.and_then(|b| b.base_fee_per_gas) {
            Some(fee) => Ok(Some(parse_quantity(&fee)?)),
            None => Ok(None),
        }
    }

    pub async fn max_priority_fee(&self) -> Result<u128> {
        self.request_quantity("eth_maxPriorityFeePerGas", json!([])).await
    }

    pub async fn gas_price(&self) -> Result<u128> {
        self.request_quantity("eth_gasPrice", json!([])).await
    }

    pub async fn estimate_gas(&self, from: &Address, to: &Address, data: &[u8]) -> Result<u64> {
        let gas = self
            .request_quantity(
                "eth_estimateGas",
                json!([{ "from": from, "to": to, "data": to_hex(data) }]),
            )
            .await?;
        u64::try_from(gas).map_err(|_| BadgeError::RpcResponse(format!("gas estimate {} out of range", gas)))
    }

    /// Broadcast a signed transaction, returning the hash reported by the node
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String> {
        self.request("eth_sendRawTransaction", json!([to_hex(raw)])).await
    }

    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash])).await
    }

    /// Read-only call against the latest block
    pub async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>> {
        let raw: String = self
            .request("eth_call", json!([{ "to": to, "data": to_hex(data) }, "latest"]))
            .await?;
        from_hex(&raw)
    }
}
