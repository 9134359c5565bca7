//! Ethereum contract client built on alloy.
//!
//! Connects over WebSocket with a local signing wallet and exposes the
//! handful of contract calls the orchestrator needs. Revert reasons are
//! decoded here so the rest of the crate never sees raw RPC payloads.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256, utils::parse_ether},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
    sol_types::decode_revert_reason,
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::domain::{ChainError, ContractClient, Role, WhitelistAddOutcome};

sol! {
    #[sol(rpc)]
    contract ZurcusNft {
        function setPrice(uint256 newPrice) external;
        function hasRole(bytes32 role, address account) external view returns (bool);
        function addWhitelistedUser(address user) external;
        function removeWhitelistedUser(address user) external;
        function WHITELISTED_ROLE() external view returns (bytes32);
    }
}

/// OpenZeppelin AccessControl's DEFAULT_ADMIN_ROLE identifier.
const DEFAULT_ADMIN_ROLE: B256 = B256::ZERO;

/// Chain client backed by a WebSocket provider and a local signer.
pub struct EthereumContractClient {
    provider: DynProvider,
    contract: ZurcusNft::ZurcusNftInstance<DynProvider>,
    address: Address,
    // Resolved from the contract once, then cached.
    whitelisted_role: OnceCell<B256>,
}

impl EthereumContractClient {
    /// Connects to the node and binds the contract at `contract_address`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed key or address and `Rpc`
    /// when the WebSocket connection cannot be established.
    pub async fn connect(
        ws_url: &str,
        private_key: &str,
        contract_address: &str,
    ) -> Result<Self, ChainError> {
        let address: Address = contract_address
            .parse()
            .map_err(|_| ChainError::InvalidArgument(format!("bad contract address: {contract_address}")))?;

        let key = private_key.strip_prefix("0x").unwrap_or(private_key);
        let signer: PrivateKeySigner = key
            .parse()
            .map_err(|_| ChainError::InvalidArgument("bad operator private key".to_string()))?;
        let wallet = EthereumWallet::from(signer);

        info!(ws_url, %address, "connecting to Ethereum node");
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(ws_url)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .erased();

        let contract = ZurcusNft::new(address, provider.clone());

        Ok(Self {
            provider,
            contract,
            address,
            whitelisted_role: OnceCell::new(),
        })
    }

    async fn whitelisted_role(&self) -> Result<B256, ChainError> {
        self.whitelisted_role
            .get_or_try_init(|| async {
                self.contract
                    .WHITELISTED_ROLE()
                    .call()
                    .await
                    .map_err(map_call_error)
            })
            .await
            .copied()
    }

    async fn role_id(&self, role: Role) -> Result<B256, ChainError> {
        match role {
            Role::DefaultAdmin => Ok(DEFAULT_ADMIN_ROLE),
            Role::Whitelisted => self.whitelisted_role().await,
        }
    }
}

/// Converts a whole-token decimal string to the 18-decimal base unit.
fn price_to_wei(price: &str) -> Result<U256, ChainError> {
    parse_ether(price.trim())
        .map_err(|e| ChainError::InvalidArgument(format!("bad price '{price}': {e}")))
}

/// Pulls a human-readable revert reason out of a contract call error, when
/// the node returned one.
fn revert_reason(err: &alloy::contract::Error) -> Option<String> {
    if let alloy::contract::Error::TransportError(rpc_err) = err {
        if let Some(payload) = rpc_err.as_error_resp() {
            if let Some(data) = payload.as_revert_data() {
                if let Some(reason) = decode_revert_reason(&data) {
                    return Some(reason);
                }
            }
            return Some(payload.message.to_string());
        }
    }
    None
}

fn map_call_error(err: alloy::contract::Error) -> ChainError {
    match revert_reason(&err) {
        Some(reason) => ChainError::Reverted(reason),
        None => ChainError::Rpc(err.to_string()),
    }
}

fn reason_indicates_already_whitelisted(reason: &str) -> bool {
    reason.to_lowercase().contains("already whitelisted")
}

fn parse_account(account: &str) -> Result<Address, ChainError> {
    account
        .parse()
        .map_err(|_| ChainError::InvalidArgument(format!("bad account address: {account}")))
}

#[async_trait]
impl ContractClient for EthereumContractClient {
    async fn network_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    fn contract_address(&self) -> String {
        self.address.to_string()
    }

    #[instrument(skip(self))]
    async fn has_role(&self, role: Role, account: &str) -> Result<bool, ChainError> {
        let role_id = self.role_id(role).await?;
        let account = parse_account(account)?;

        self.contract
            .hasRole(role_id, account)
            .call()
            .await
            .map_err(map_call_error)
    }

    #[instrument(skip(self))]
    async fn set_price(&self, price_eth: &str) -> Result<String, ChainError> {
        let wei = price_to_wei(price_eth)?;

        let pending = self
            .contract
            .setPrice(wei)
            .send()
            .await
            .map_err(map_call_error)?;
        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;

        info!(%tx_hash, "setPrice confirmed");
        Ok(tx_hash.to_string())
    }

    #[instrument(skip(self))]
    async fn add_whitelisted(&self, account: &str) -> Result<WhitelistAddOutcome, ChainError> {
        let account = parse_account(account)?;

        let pending = match self.contract.addWhitelistedUser(account).send().await {
            Ok(pending) => pending,
            Err(err) => {
                // A concurrent grant surfaces as a revert at submission
                // time. That state is what the caller asked for.
                if let Some(reason) = revert_reason(&err) {
                    if reason_indicates_already_whitelisted(&reason) {
                        return Ok(WhitelistAddOutcome::AlreadyWhitelisted);
                    }
                    return Err(ChainError::Reverted(reason));
                }
                return Err(ChainError::Rpc(err.to_string()));
            }
        };

        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;

        info!(%tx_hash, %account, "addWhitelistedUser confirmed");
        Ok(WhitelistAddOutcome::Added)
    }

    #[instrument(skip(self))]
    async fn remove_whitelisted(&self, account: &str) -> Result<(), ChainError> {
        let account = parse_account(account)?;

        let pending = self
            .contract
            .removeWhitelistedUser(account)
            .send()
            .await
            .map_err(map_call_error)?;
        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;

        info!(%tx_hash, %account, "removeWhitelistedUser confirmed");
        Ok(())
    }
}
