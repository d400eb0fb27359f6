//! Pool descriptors: every address one AMM pool deployment and its paired
//! order-book market expose to a swap.
//!
//! Only the shape is checked here (all sixteen addresses present and non-default).
//! Whether the addresses belong to one live deployment is decided on-chain.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::constants::POOL_ACCOUNTS_LEN;
use crate::error::{SwapError, SwapResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolDescriptor {
    /// Program that receives the swap instruction (the router in front of the pool).
    pub router_program_id: Pubkey,
    // amm
    pub amm_program_id: Pubkey,
    pub amm_id: Pubkey,
    pub amm_authority: Pubkey,
    pub amm_open_orders: Pubkey,
    pub amm_target_orders: Pubkey,
    pub pool_coin_token_account: Pubkey,
    pub pool_pc_token_account: Pubkey,
    // order book
    pub serum_program_id: Pubkey,
    pub serum_market: Pubkey,
    pub serum_bids: Pubkey,
    pub serum_asks: Pubkey,
    pub serum_event_queue: Pubkey,
    pub serum_coin_vault_account: Pubkey,
    pub serum_pc_vault_account: Pubkey,
    pub serum_vault_signer: Pubkey,
}

const FIELD_NAMES: [&str; POOL_ACCOUNTS_LEN] = [
    "routerProgramId",
    "programId",
    "ammId",
    "ammAuthority",
    "ammOpenOrders",
    "ammTargetOrders",
    "poolCoinTokenAccount",
    "poolPcTokenAccount",
    "serumProgramId",
    "serumMarket",
    "serumBids",
    "serumAsks",
    "serumEventQueue",
    "serumCoinVaultAccount",
    "serumPcVaultAccount",
    "serumVaultSigner",
];

impl PoolDescriptor {
    /// Build from the sixteen addresses in `FIELD_NAMES` order.
    pub fn from_keys(keys: &[Pubkey]) -> SwapResult<Self> {
        let keys: &[Pubkey; POOL_ACCOUNTS_LEN] = keys.try_into().map_err(|_| {
            SwapError::UnknownPoolAccount(format!(
                "expected {} pool accounts, got {}",
                POOL_ACCOUNTS_LEN,
                keys.len()
            ))
        })?;
        let pool = Self {
            router_program_id: keys[0],
            amm_program_id: keys[1],
            amm_id: keys[2],
            amm_authority: keys[3],
            amm_open_orders: keys[4],
            amm_target_orders: keys[5],
            pool_coin_token_account: keys[6],
            pool_pc_token_account: keys[7],
            serum_program_id: keys[8],
            serum_market: keys[9],
            serum_bids: keys[10],
            serum_asks: keys[11],
            serum_event_queue: keys[12],
            serum_coin_vault_account: keys[13],
            serum_pc_vault_account: keys[14],
            serum_vault_signer: keys[15],
        };
        pool.validate()?;
        Ok(pool)
    }

    pub fn keys(&self) -> [Pubkey; POOL_ACCOUNTS_LEN] {
        [
            self.router_program_id,
            self.amm_program_id,
            self.amm_id,
            self.amm_authority,
            self.amm_open_orders,
            self.amm_target_orders,
            self.pool_coin_token_account,
            self.pool_pc_token_account,
            self.serum_program_id,
            self.serum_market,
            self.serum_bids,
            self.serum_asks,
            self.serum_event_queue,
            self.serum_coin_vault_account,
            self.serum_pc_vault_account,
            self.serum_vault_signer,
        ]
    }

    /// Reject descriptors with an unset (all-zero) address.
    pub fn validate(&self) -> SwapResult<()> {
        match self
            .keys()
            .iter()
            .zip(FIELD_NAMES)
            .find(|(key, _)| **key == Pubkey::default())
        {
            Some((_, name)) => Err(SwapError::UnknownPoolAccount(name.to_string())),
            None => Ok(()),
        }
    }
}

// ── Named Keys (JSON pool files) ────────────────────────────────────────────

/// Pool addresses as base58 strings, keyed the way published pool lists name
/// them. Extra fields (`name`, `coin`, `version`, ...) are ignored.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PoolKeys {
    pub router_program_id: Option<String>,
    pub program_id: Option<String>,
    pub amm_id: Option<String>,
    pub amm_authority: Option<String>,
    pub amm_open_orders: Option<String>,
    pub amm_target_orders: Option<String>,
    pub pool_coin_token_account: Option<String>,
    pub pool_pc_token_account: Option<String>,
    pub serum_program_id: Option<String>,
    pub serum_market: Option<String>,
    pub serum_bids: Option<String>,
    pub serum_asks: Option<String>,
    pub serum_event_queue: Option<String>,
    pub serum_coin_vault_account: Option<String>,
    pub serum_pc_vault_account: Option<String>,
    pub serum_vault_signer: Option<String>,
}

impl PoolKeys {
    fn values(&self) -> [&Option<String>; POOL_ACCOUNTS_LEN] {
        [
            &self.router_program_id,
            &self.program_id,
            &self.amm_id,
            &self.amm_authority,
            &self.amm_open_orders,
            &self.amm_target_orders,
            &self.pool_coin_token_account,
            &self.pool_pc_token_account,
            &self.serum_program_id,
            &self.serum_market,
            &self.serum_bids,
            &self.serum_asks,
            &self.serum_event_queue,
            &self.serum_coin_vault_account,
            &self.serum_pc_vault_account,
            &self.serum_vault_signer,
        ]
    }
}

impl TryFrom<&PoolKeys> for PoolDescriptor {
    type Error = SwapError;

    fn try_from(keys: &PoolKeys) -> SwapResult<Self> {
        let parsed = keys
            .values()
            .iter()
            .zip(FIELD_NAMES)
            .map(|(value, name)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .and_then(|s| Pubkey::from_str(s).ok())
                    .ok_or_else(|| SwapError::UnknownPoolAccount(name.to_string()))
            })
            .collect::<SwapResult<Vec<Pubkey>>>()?;
        Self::from_keys(&parsed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::{LIQUIDITY_POOL_PROGRAM_ID_V4, SERUM_PROGRAM_ID_V3};

    pub(crate) fn mock_pool() -> PoolDescriptor {
        PoolDescriptor {
            router_program_id: Pubkey::new_unique(),
            amm_program_id: LIQUIDITY_POOL_PROGRAM_ID_V4,
            amm_id: Pubkey::new_unique(),
            amm_authority: Pubkey::new_unique(),
            amm_open_orders: Pubkey::new_unique(),
            amm_target_orders: Pubkey::new_unique(),
            pool_coin_token_account: Pubkey::new_unique(),
            pool_pc_token_account: Pubkey::new_unique(),
            serum_program_id: SERUM_PROGRAM_ID_V3,
            serum_market: Pubkey::new_unique(),
            serum_bids: Pubkey::new_unique(),
            serum_asks: Pubkey::new_unique(),
            serum_event_queue: Pubkey::new_unique(),
            serum_coin_vault_account: Pubkey::new_unique(),
            serum_pc_vault_account: Pubkey::new_unique(),
            serum_vault_signer: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_keys_round_trip_through_from_keys() {
        let pool = mock_pool();
        let rebuilt = PoolDescriptor::from_keys(&pool.keys()).unwrap();
        assert_eq!(rebuilt, pool);
    }

    #[test]
    fn test_wrong_key_count_rejected() {
        let keys = mock_pool().keys();
        let err = PoolDescriptor::from_keys(&keys[..15]).unwrap_err();
        assert!(matches!(err, SwapError::UnknownPoolAccount(_)));
    }

    #[test]
    fn test_default_key_names_field() {
        let mut pool = mock_pool();
        pool.serum_event_queue = Pubkey::default();
        match pool.validate().unwrap_err() {
            SwapError::UnknownPoolAccount(name) => assert_eq!(name, "serumEventQueue"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pool_keys_from_json() {
        let json = r#"{
            "name": "SOL-USDC",
            "version": 4,
            "routerProgramId": "22G6174cvQTxmgVxgZ88AAAFiDMTtHm9DgM6WX6dZd2k",
            "programId": "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8",
            "ammId": "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2",
            "ammAuthority": "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1",
            "ammOpenOrders": "HRk9CMrpq7Jn9sh7mzxE8CChHG8dneX9p475QKz4Fsfc",
            "ammTargetOrders": "CZza3Ej4Mc58MnxWA385itCC9jCo3L1D7zc3LKy1bZMR",
            "poolCoinTokenAccount": "DQyrAcCrDXQ7NeoqGgDCZwBvWDcYmFCjSb9JtteuvPpz",
            "poolPcTokenAccount": "HLmqeL62xR1QoZ1HKKbXRrdN1p3phKpxRMb2VVopvBBz",
            "serumProgramId": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "serumMarket": "9wFFyRfZBsuAha4YcuxcXLKwMxJR43S7fPfQLusDBzvT",
            "serumBids": "14ivtgssEBoBjuZJtSAPKYgpUK7DmnSwuPMqJoVTSgKJ",
            "serumAsks": "CEQdAFKdycHugujQg9k2wbmxjcpdYZyVLfV9WerTnafJ",
            "serumEventQueue": "5KKsLVU6TcbVDK4BS6K1DGDxnh4Q9xjYJ8XaDCG5t8ht",
            "serumCoinVaultAccount": "36c6YqAwyGKQG66XEp2dJc5JqjaBNv7sVghEtJv4c7u6",
            "serumPcVaultAccount": "8CFo8bL8mZQK8abbFyypFMwEDd8tVJjHTTojMLgQTUSZ",
            "serumVaultSigner": "F8Vyqk3unwxkXukZFQeYyGmFfTG3CAX4v24iyrjEYBJV"
        }"#;
        let keys: PoolKeys = serde_json::from_str(json).unwrap();
        let pool = PoolDescriptor::try_from(&keys).unwrap();
        assert_eq!(pool.amm_program_id, LIQUIDITY_POOL_PROGRAM_ID_V4);
        assert_eq!(pool.serum_program_id, SERUM_PROGRAM_ID_V3);
        assert_eq!(
            pool.amm_id,
            Pubkey::from_str("58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2").unwrap()
        );
    }

    #[test]
    fn test_pool_keys_missing_field() {
        let mut keys = PoolKeys::default();
        for (slot, key) in [
            &mut keys.router_program_id,
            &mut keys.program_id,
            &mut keys.amm_id,
        ]
        .into_iter()
        .zip(mock_pool().keys())
        {
            *slot = Some(key.to_string());
        }
        match PoolDescriptor::try_from(&keys).unwrap_err() {
            SwapError::UnknownPoolAccount(name) => assert_eq!(name, "ammAuthority"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pool_keys_invalid_base58() {
        let mut keys = PoolKeys::default();
        keys.router_program_id = Some("not-a-key".to_string());
        match PoolDescriptor::try_from(&keys).unwrap_err() {
            SwapError::UnknownPoolAccount(name) => assert_eq!(name, "routerProgramId"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
