/// Network, identity and onboarding constants shared across the codebase

// Networks (values accepted by BADGE_NETWORK / `network` in config.toml)
pub const BASE_SEPOLIA: &str = "base-sepolia";
pub const BASE_MAINNET: &str = "base-mainnet";

pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;
pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;

// Environment variables
pub const ENV_NETWORK: &str = "BADGE_NETWORK";
pub const ENV_SEPOLIA_RPC_URL: &str = "BASE_SEPOLIA_RPC_URL";
pub const ENV_SEPOLIA_CHAIN_ID: &str = "BASE_SEPOLIA_CHAIN_ID";
pub const ENV_MAINNET_RPC_URL: &str = "BASE_MAINNET_RPC_URL";
pub const ENV_MAINNET_CHAIN_ID: &str = "BASE_MAINNET_CHAIN_ID";
pub const ENV_PRIVATE_KEY: &str = "DEPLOYER_PRIVATE_KEY";
pub const ENV_CONTRACT_ADDRESS: &str = "BASE_BEGINNER_BADGE_ADDRESS";
pub const ENV_MOCK_USER_ID: &str = "MOCK_USER_ID";
pub const ENV_MOCK_USER_ID_LEGACY: &str = "NEXT_PUBLIC_MOCK_USER_ID";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_METRICS_PORT: &str = "BADGE_METRICS_PORT";

// Farcaster Mini App request context
pub const HEADER_USER: &str = "x-fc-user";
pub const HEADER_USER_ALT: &str = "x-farcaster-user";
pub const HEADER_SIGNER: &str = "x-fc-signer";
pub const HEADER_SIGNER_ALT: &str = "x-farcaster-signer";

/// Identity used when neither the request nor the config names a user
pub const LOCAL_DEV_USER: &str = "local-dev-user";

pub const DEFAULT_QUIZ_ANSWER: &str = "Ethereum";

pub const MISSING_MINT_CONFIG: &str = "Missing RPC_URL, DEPLOYER_PRIVATE_KEY, or contract address";
pub const MISSING_SIGNER_ADDRESS: &str = "Missing signer address in Farcaster context";

/// Priority fee used when the node does not implement eth_maxPriorityFeePerGas (1 gwei)
pub const FALLBACK_PRIORITY_FEE_WEI: u128 = 1_000_000_000;

/// Map a network name to its default chain id
pub fn default_chain_id(network: &str) -> Option<u64> {
    match network {
        BASE_SEPOLIA => Some(BASE_SEPOLIA_CHAIN_ID),
        BASE_MAINNET => Some(BASE_MAINNET_CHAIN_ID),
        _ => None,
    }
}
