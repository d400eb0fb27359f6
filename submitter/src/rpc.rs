// Chain reads for the assembler, served by a blocking RPC client.

use std::str::FromStr;

use ammswap_sdk::{AccountSource, SwapError, SwapResult, TokenAccountRecord};
use serde_json::Value;
use solana_account_decoder::UiAccountData;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_client::rpc_response::RpcKeyedAccount;
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use tracing::debug;

pub struct RpcAccountSource<'a> {
    client: &'a RpcClient,
}

impl<'a> RpcAccountSource<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }
}

fn rpc_failure(what: &str, e: impl std::fmt::Display) -> SwapError {
    SwapError::AccountResolutionFailure(format!("{} failed: {}", what, e))
}

fn parse_key(address: &Pubkey, field: &str, value: &Value) -> SwapResult<Pubkey> {
    value
        .as_str()
        .and_then(|s| Pubkey::from_str(s).ok())
        .ok_or_else(|| {
            rpc_failure(
                &format!("reading {} of token account {}", field, address),
                "missing or invalid",
            )
        })
}

/// Token account from the `jsonParsed` shape:
/// `{"type": "account", "info": {"mint", "owner", "tokenAmount": {"amount"}}}`.
fn record_from_parsed(address: Pubkey, parsed: &Value) -> SwapResult<TokenAccountRecord> {
    let info = &parsed["info"];
    let mint = parse_key(&address, "mint", &info["mint"])?;
    let owner = parse_key(&address, "owner", &info["owner"])?;
    let amount = info["tokenAmount"]["amount"]
        .as_str()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| {
            rpc_failure(
                &format!("reading amount of token account {}", address),
                "missing or invalid",
            )
        })?;
    Ok(TokenAccountRecord {
        address,
        mint,
        owner,
        amount,
    })
}

/// Token account from its raw 165-byte layout.
fn record_from_bytes(address: Pubkey, data: &[u8]) -> SwapResult<TokenAccountRecord> {
    let state = spl_token::state::Account::unpack(data)
        .map_err(|e| rpc_failure(&format!("decoding token account {}", address), e))?;
    Ok(TokenAccountRecord {
        address,
        mint: state.mint,
        owner: state.owner,
        amount: state.amount,
    })
}

fn record_from_keyed(keyed: &RpcKeyedAccount) -> SwapResult<TokenAccountRecord> {
    let address = Pubkey::from_str(&keyed.pubkey)
        .map_err(|e| rpc_failure(&format!("parsing account address {}", keyed.pubkey), e))?;
    match &keyed.account.data {
        UiAccountData::Json(parsed) => record_from_parsed(address, &parsed.parsed),
        binary => {
            let data = binary.decode().ok_or_else(|| {
                rpc_failure(
                    &format!("decoding token account {}", address),
                    "unsupported encoding",
                )
            })?;
            record_from_bytes(address, &data)
        }
    }
}

impl AccountSource for RpcAccountSource<'_> {
    /// Every token-program account owned by `owner`, via `getTokenAccountsByOwner`.
    fn token_accounts_by_owner(&self, owner: &Pubkey) -> SwapResult<Vec<TokenAccountRecord>> {
        let accounts = self
            .client
            .get_token_accounts_by_owner_with_commitment(
                owner,
                TokenAccountsFilter::ProgramId(spl_token::id()),
                self.client.commitment(),
            )
            .map_err(|e| rpc_failure("getTokenAccountsByOwner", e))?
            .value;
        debug!(%owner, count = accounts.len(), "fetched token accounts");

        accounts.iter().map(record_from_keyed).collect()
    }

    fn native_balance(&self, owner: &Pubkey) -> SwapResult<u64> {
        self.client
            .get_balance(owner)
            .map_err(|e| rpc_failure("getBalance", e))
    }

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SwapResult<u64> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .map_err(|e| rpc_failure("getMinimumBalanceForRentExemption", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ammswap_sdk::constants::TOKEN_ACCOUNT_LEN;
    use serde_json::json;
    use spl_token::state::{Account, AccountState};

    #[test]
    fn test_record_from_parsed() {
        let address = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let parsed = json!({
            "type": "account",
            "info": {
                "isNative": false,
                "mint": mint.to_string(),
                "owner": owner.to_string(),
                "state": "initialized",
                "tokenAmount": {
                    "amount": "16185",
                    "decimals": 6,
                    "uiAmount": 0.016185,
                    "uiAmountString": "0.016185"
                }
            }
        });

        let record = record_from_parsed(address, &parsed).unwrap();
        assert_eq!(record.address, address);
        assert_eq!(record.mint, mint);
        assert_eq!(record.owner, owner);
        assert_eq!(record.amount, 16_185);
    }

    #[test]
    fn test_record_from_parsed_missing_amount() {
        let parsed = json!({
            "type": "account",
            "info": {
                "mint": Pubkey::new_unique().to_string(),
                "owner": Pubkey::new_unique().to_string()
            }
        });
        let err = record_from_parsed(Pubkey::new_unique(), &parsed).unwrap_err();
        assert!(matches!(err, SwapError::AccountResolutionFailure(_)));
    }

    #[test]
    fn test_record_from_bytes() {
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let state = Account {
            mint,
            owner,
            amount: 100_000,
            state: AccountState::Initialized,
            ..Account::default()
        };
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        Account::pack(state, &mut data).unwrap();

        let address = Pubkey::new_unique();
        let record = record_from_bytes(address, &data).unwrap();
        assert_eq!(record.mint, mint);
        assert_eq!(record.owner, owner);
        assert_eq!(record.amount, 100_000);

        let err = record_from_bytes(address, &data[..64]).unwrap_err();
        assert!(matches!(err, SwapError::AccountResolutionFailure(_)));
    }
}
