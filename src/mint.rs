//! Minting the Base Beginner Badge through the deployer wallet.

use crate::chain::{abi, Address, Eip1559Transaction, RpcClient, TransactionReceipt, Wallet};
use crate::config::ChainConfig;
use crate::constants::{FALLBACK_PRIORITY_FEE_WEI, MISSING_MINT_CONFIG};
use crate::error::{BadgeError, Result};
use crate::metrics::BadgeMetrics;
use crate::types::MintResult;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Anything that can put a badge in a wallet
#[async_trait]
pub trait Minter: Send + Sync {
    /// Never panics or returns `Err`: failures come back as `MintResult::Failed`
    async fn mint_badge(&self, to: &Address) -> MintResult;
}

struct Deployment {
    rpc: RpcClient,
    wallet: Wallet,
    contract: Address,
    chain_id: u64,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

/// Sends `mintTo(address)` to the badge contract, signed by the deployer key
pub struct ContractMinter {
    deployment: Option<Deployment>,
}

impl ContractMinter {
    /// Missing settings give an unconfigured minter whose mints fail;
    /// settings that are present but malformed are an error.
    pub fn from_config(chain: &ChainConfig) -> Result<Self> {
        let (Some(rpc_url), Some(private_key), Some(contract)) = (
            chain.rpc_url.as_deref(),
            chain.private_key.as_ref(),
            chain.contract_address.as_deref(),
        ) else {
            warn!("Badge minting is not configured: {}", MISSING_MINT_CONFIG);
            return Ok(Self { deployment: None });
        };

        let wallet = Wallet::from_hex(private_key.expose())?;
        let contract: Address = contract.parse()?;
        let rpc = RpcClient::new(rpc_url, Duration::from_secs(chain.rpc_timeout_secs))?;
        info!(
            "Minting via {} on chain {} as {} (contract {})",
            rpc.url(),
            chain.chain_id(),
            wallet.address(),
            contract
        );

        Ok(Self {
            deployment: Some(Deployment {
                rpc,
                wallet,
                contract,
                chain_id: chain.chain_id(),
                receipt_timeout: Duration::from_secs(chain.receipt_timeout_secs),
                poll_interval: Duration::from_millis(chain.receipt_poll_interval_ms),
            }),
        })
    }

    pub fn unconfigured() -> Self {
        Self { deployment: None }
    }

    pub fn is_configured(&self) -> bool {
        self.deployment.is_some()
    }

    fn deployment(&self) -> Result<&Deployment> {
        self.deployment
            .as_ref()
            .ok_or_else(|| BadgeError::Config(MISSING_MINT_CONFIG.to_string()))
    }

    /// Current `owner()` of the badge contract
    pub async fn badge_owner(&self) -> Result<Address> {
        let d = self.deployment()?;
        let output = d.rpc.call(&d.contract, &abi::encode_owner()).await?;
        abi::decode_address(&output)
    }

    async fn send_mint(&self, d: &Deployment, to: &Address) -> Result<String> {
        let node_chain_id = d.rpc.chain_id().await?;
        if node_chain_id != d.chain_id {
            return Err(BadgeError::Config(format!(
                "RPC endpoint is on chain {} but chain {} is configured",
                node_chain_id, d.chain_id
            )));
        }

        let from = d.wallet.address();
        let data = abi::encode_mint_to(to);
        let nonce = d.rpc.transaction_count(&from).await?;
        let (max_priority_fee_per_gas, max_fee_per_gas) = fee_data(&d.rpc).await?;
        let gas_limit = d.rpc.estimate_gas(&from, &d.contract, &data).await?;

        let tx = Eip1559Transaction {
            chain_id: d.chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: d.contract,
            value: 0,
            data,
        };
        let signed = d.wallet.sign_transaction(&tx)?;
        debug!(nonce, gas_limit, max_fee_per_gas = %max_fee_per_gas, "Signed mintTo transaction");

        let broadcast_hash = d.rpc.send_raw_transaction(&signed.raw).await?;
        if !broadcast_hash.eq_ignore_ascii_case(&signed.hash_hex()) {
            warn!(
                "Node reported hash {} for locally computed {}",
                broadcast_hash,
                signed.hash_hex()
            );
        }
        info!("Sent mintTo({}) as {}", to, broadcast_hash);

        let receipt = wait_for_receipt(d, &broadcast_hash).await?;
        Ok(receipt.transaction_hash.unwrap_or(broadcast_hash))
    }
}

#[async_trait]
impl Minter for ContractMinter {
    async fn mint_badge(&self, to: &Address) -> MintResult {
        let Some(deployment) = self.deployment.as_ref() else {
            return MintResult::failed(MISSING_MINT_CONFIG);
        };

        let started = Instant::now();
        let result = match self.send_mint(deployment, to).await {
            Ok(tx_hash) => {
                info!("Minted badge to {} in {}", to, tx_hash);
                MintResult::Minted { tx_hash }
            }
            Err(e) => {
                error!("mint failed: {}", e);
                MintResult::failed(e.to_string())
            }
        };
        BadgeMetrics::record_mint_duration(started.elapsed().as_secs_f64());
        result
    }
}

/// (priority fee, max fee). Max fee leaves room for the base fee to double.
async fn fee_data(rpc: &RpcClient) -> Result<(u128, u128)> {
    match rpc.latest_base_fee().await? {
        Some(base_fee) => {
            let priority = match rpc.max_priority_fee().await {
                Ok(fee) => fee,
                Err(e) => {
                    debug!("eth_maxPriorityFeePerGas unavailable ({}), using 1 gwei", e);
                    FALLBACK_PRIORITY_FEE_WEI
                }
            };
            Ok((priority, base_fee.saturating_mul(2).saturating_add(priority)))
        }
        None => {
            let gas_price = rpc.gas_price().await?;
            Ok((gas_price, gas_price))
        }
    }
}

async fn wait_for_receipt(d: &Deployment, tx_hash: &str) -> Result<TransactionReceipt> {
    let deadline = tokio::time::Instant::now() + d.receipt_timeout;
    loop {
        // The transaction is already broadcast, so a failed lookup counts as
        // "not mined yet" rather than a failed mint
        match d.rpc.transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) if receipt.reverted() => {
                return Err(BadgeError::Receipt {
                    tx_hash: tx_hash.to_string(),
                    message: "transaction reverted".to_string(),
                });
            }
            Ok(Some(receipt)) => return Ok(receipt),
            Ok(None) => {}
            Err(e) => warn!("Receipt lookup for {} failed, still waiting: {}", tx_hash, e),
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(BadgeError::Receipt {
                tx_hash: tx_hash.to_string(),
                message: format!("no receipt after {}s", d.receipt_timeout.as_secs()),
            });
        }
        tokio::time::sleep(d.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

    fn ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    async fn mock_rpc(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": rpc_method})))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn chain_config(rpc_url: &str) -> ChainConfig {
        ChainConfig {
            rpc_url: Some(rpc_url.to_string()),
            private_key: Some(Secret::new(
                "0x0000000000000000000000000000000000000000000000000000000000000001",
            )),
            contract_address: Some("0x1111111111111111111111111111111111111111".to_string()),
            receipt_timeout_secs: 5,
            receipt_poll_interval_ms: 10,
            ..ChainConfig::default()
        }
    }

    fn recipient() -> Address {
        "0x2222222222222222222222222222222222222222".parse().unwrap()
    }

    async fn mock_happy_path_until_receipt(server: &MockServer) {
        mock_rpc(server, "eth_chainId", ok(json!("0x14a34"))).await;
        mock_rpc(server, "eth_getTransactionCount", ok(json!("0x5"))).await;
        mock_rpc(server, "eth_getBlockByNumber", ok(json!({"number": "0x10", "baseFeePerGas": "0x64"}))).await;
        mock_rpc(server, "eth_maxPriorityFeePerGas", ok(json!("0x3b9aca00"))).await;
        mock_rpc(server, "eth_estimateGas", ok(json!("0x186a0"))).await;
        mock_rpc(server, "eth_sendRawTransaction", ok(json!(TX_HASH))).await;
    }

    #[tokio::test]
    async fn test_unconfigured_minter_fails_without_network() {
        let minter = ContractMinter::from_config(&ChainConfig::default()).unwrap();
        assert!(!minter.is_configured());
        assert_eq!(
            minter.mint_badge(&recipient()).await,
            MintResult::Failed { error: MISSING_MINT_CONFIG.to_string() }
        );
    }

    #[tokio::test]
    async fn test_malformed_settings_are_rejected() {
        let mut config = chain_config("http://localhost:8545");
        config.contract_address = Some("0x123".to_string());
        assert!(matches!(
            ContractMinter::from_config(&config),
            Err(BadgeError::InvalidAddress(_))
        ));

        let mut config = chain_config("http://localhost:8545");
        config.private_key = Some(Secret::new("0xnothex"));
        assert!(matches!(ContractMinter::from_config(&config), Err(BadgeError::Signing(_))));
    }

    #[tokio::test]
    async fn test_successful_mint_returns_receipt_hash() {
        let server = MockServer::start().await;
        mock_happy_path_until_receipt(&server).await;
        mock_rpc(
            &server,
            "eth_getTransactionReceipt",
            ok(json!({"transactionHash": TX_HASH, "blockNumber": "0x11", "status": "0x1"})),
        )
        .await;

        let minter = ContractMinter::from_config(&chain_config(&server.uri())).unwrap();
        let result = minter.mint_badge(&recipient()).await;
        assert_eq!(result, MintResult::Minted { tx_hash: TX_HASH.to_string() });

        // The broadcast payload is a typed (0x02) transaction
        let requests = server.received_requests().await.unwrap();
        let raw = requests
            .iter()
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .find(|body| body["method"] == "eth_sendRawTransaction")
            .and_then(|body| body["params"][0].as_str().map(str::to_string))
            .unwrap();
        assert!(raw.starts_with("0x02"));
    }

    #[tokio::test]
    async fn test_receipt_lookup_error_keeps_polling() {
        let server = MockServer::start().await;
        mock_happy_path_until_receipt(&server).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        mock_rpc(
            &server,
            "eth_getTransactionReceipt",
            ok(json!({"transactionHash": TX_HASH, "blockNumber": "0x11", "status": "0x1"})),
        )
        .await;

        let minter = ContractMinter::from_config(&chain_config(&server.uri())).unwrap();
        let result = minter.mint_badge(&recipient()).await;
        assert_eq!(result, MintResult::Minted { tx_hash: TX_HASH.to_string() });

        let broadcasts = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .filter(|body| body["method"] == "eth_sendRawTransaction")
            .count();
        assert_eq!(broadcasts, 1);
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_a_failure() {
        let server = MockServer::start().await;
        mock_happy_path_until_receipt(&server).await;
        mock_rpc(
            &server,
            "eth_getTransactionReceipt",
            ok(json!({"transactionHash": TX_HASH, "blockNumber": "0x11", "status": "0x0"})),
        )
        .await;

        let minter = ContractMinter::from_config(&chain_config(&server.uri())).unwrap();
        match minter.mint_badge(&recipient()).await {
            MintResult::Failed { error } => assert!(error.contains("reverted"), "{error}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_receipt_timeout_is_a_failure() {
        let server = MockServer::start().await;
        mock_happy_path_until_receipt(&server).await;
        mock_rpc(&server, "eth_getTransactionReceipt", ok(Value::Null)).await;

        let mut config = chain_config(&server.uri());
        config.receipt_timeout_secs = 0;
        let minter = ContractMinter::from_config(&config).unwrap();
        match minter.mint_badge(&recipient()).await {
            MintResult::Failed { error } => assert!(error.contains("no receipt"), "{error}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_chain_is_a_failure() {
        let server = MockServer::start().await;
        mock_rpc(&server, "eth_chainId", ok(json!("0x2105"))).await;

        let minter = ContractMinter::from_config(&chain_config(&server.uri())).unwrap();
        match minter.mint_badge(&recipient()).await {
            MintResult::Failed { error } => {
                assert!(error.contains("chain 8453"), "{error}");
                assert!(error.contains("84532"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rpc_error_message_is_surfaced() {
        let server = MockServer::start().await;
        mock_rpc(&server, "eth_chainId", ok(json!("0x14a34"))).await;
        mock_rpc(&server, "eth_getTransactionCount", ok(json!("0x0"))).await;
        mock_rpc(&server, "eth_getBlockByNumber", ok(json!({"baseFeePerGas": "0x64"}))).await;
        mock_rpc(&server, "eth_maxPriorityFeePerGas", ok(json!("0x1"))).await;
        mock_rpc(
            &server,
            "eth_estimateGas",
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": 3, "message": "execution reverted: Ownable: caller is not the owner"}
            })),
        )
        .await;

        let minter = ContractMinter::from_config(&chain_config(&server.uri())).unwrap();
        match minter.mint_badge(&recipient()).await {
            MintResult::Failed { error } => assert!(error.contains("caller is not the owner"), "{error}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_priority_fee_falls_back_when_unsupported() {
        let server = MockServer::start().await;
        mock_rpc(&server, "eth_getBlockByNumber", ok(json!({"baseFeePerGas": "0x64"}))).await;
        mock_rpc(
            &server,
            "eth_maxPriorityFeePerGas",
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32601, "message": "method not found"}
            })),
        )
        .await;

        let rpc = RpcClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let (priority, max_fee) = fee_data(&rpc).await.unwrap();
        assert_eq!(priority, FALLBACK_PRIORITY_FEE_WEI);
        assert_eq!(max_fee, 200 + FALLBACK_PRIORITY_FEE_WEI);
    }

    #[tokio::test]
    async fn test_badge_owner() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "eth_call",
            ok(json!("0x0000000000000000000000007e5f4552091a69125d5dfcb7b8c2659029395bdf")),
        )
        .await;

        let minter = ContractMinter::from_config(&chain_config(&server.uri())).unwrap();
        let owner = minter.badge_owner().await.unwrap();
        assert_eq!(owner.to_string(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");

        assert!(ContractMinter::unconfigured().badge_owner().await.is_err());
    }
}
