//! Owner token-account discovery and idempotent account resolution.
//!
//! The owner's accounts are scanned once per assembly into an
//! `OwnerTokenAccountIndex`. Only canonical (associated) accounts are ever
//! selected for a swap; other funded accounts are reported as auxiliary.

use std::collections::HashMap;

use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tracing::{debug, warn};

use crate::builder::PendingInstructions;
use crate::constants::{
    associated_token_program_id, native_mint, token_program_id, TOKEN_ACCOUNT_LEN,
};
use crate::derivation::derive_associated_address;
use crate::error::{SwapError, SwapResult};
use crate::instruction::{
    create_associated_token_account, create_token_account, initialize_token_account,
};

// ── Chain Reads ─────────────────────────────────────────────────────────────

/// A token account as reported by the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccountRecord {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    /// Balance in base units.
    pub amount: u64,
}

/// Reads the assembler needs from the chain. Implementations map transport
/// failures to `SwapError::AccountResolutionFailure` and never retry.
pub trait AccountSource {
    fn token_accounts_by_owner(&self, owner: &Pubkey) -> SwapResult<Vec<TokenAccountRecord>>;

    fn native_balance(&self, owner: &Pubkey) -> SwapResult<u64>;

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SwapResult<u64>;
}

// ── Owner Index ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedAccount {
    pub address: Pubkey,
    pub balance: u64,
}

/// mint → canonical account, built once and read-only afterwards.
#[derive(Clone, Debug)]
pub struct OwnerTokenAccountIndex {
    canonical: HashMap<Pubkey, ResolvedAccount>,
    auxiliary: Vec<TokenAccountRecord>,
    native_balance: u64,
}

impl OwnerTokenAccountIndex {
    pub fn scan<S: AccountSource + ?Sized>(source: &S, owner: &Pubkey) -> SwapResult<Self> {
        let records = source.token_accounts_by_owner(owner)?;
        let native_balance = source.native_balance(owner)?;
        Self::from_records(owner, records, native_balance)
    }

    /// Classify each record as canonical (at the derived associated address for
    /// its mint) or auxiliary (anywhere else, with a positive balance). Empty
    /// non-canonical accounts are dropped.
    pub fn from_records(
        owner: &Pubkey,
        records: Vec<TokenAccountRecord>,
        native_balance: u64,
    ) -> SwapResult<Self> {
        let token_program = token_program_id();
        let associated_program = associated_token_program_id();
        let mut canonical = HashMap::with_capacity(records.len());
        let mut auxiliary = Vec::new();

        for record in records {
            if record.owner != *owner {
                return Err(SwapError::AccountResolutionFailure(format!(
                    "account {} is owned by {}, not {}",
                    record.address, record.owner, owner
                )));
            }

            let (associated, _) =
                derive_associated_address(owner, &record.mint, &token_program, &associated_program)?;

            if associated == record.address {
                let resolved = ResolvedAccount {
                    address: record.address,
                    balance: record.amount,
                };
                if canonical.insert(record.mint, resolved).is_some() {
                    return Err(SwapError::AccountResolutionFailure(format!(
                        "duplicate canonical account for mint {}",
                        record.mint
                    )));
                }
            } else if record.amount > 0 {
                warn!(
                    account = %record.address,
                    mint = %record.mint,
                    amount = record.amount,
                    "auxiliary token account holds a balance; it is never used for swaps"
                );
                auxiliary.push(record);
            }
        }

        Ok(Self {
            canonical,
            auxiliary,
            native_balance,
        })
    }

    pub fn get(&self, mint: &Pubkey) -> Option<&ResolvedAccount> {
        self.canonical.get(mint)
    }

    pub fn auxiliary(&self) -> &[TokenAccountRecord] {
        &self.auxiliary
    }

    pub fn native_balance(&self) -> u64 {
        self.native_balance
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

// ── Resolution ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRequirement {
    /// Caller-supplied account, used verbatim.
    Existing(Pubkey),
    /// The owner's canonical associated account for `mint`.
    Associated { mint: Pubkey },
    /// A fresh account at a one-time keypair, funded with `lamports` or the
    /// rent-exempt minimum when `None`.
    Owned { mint: Pubkey, lamports: Option<u64> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    Source,
    Destination,
}

pub struct AccountResolver<'a, S: AccountSource + ?Sized> {
    source: &'a S,
    owner: Pubkey,
}

impl<'a, S: AccountSource + ?Sized> AccountResolver<'a, S> {
    pub fn new(source: &'a S, owner: Pubkey) -> Self {
        Self { source, owner }
    }

    /// Return the account satisfying `requirement`, appending whatever
    /// instructions are needed to create it.
    pub fn resolve_or_create(
        &self,
        requirement: &AccountRequirement,
        role: AccountRole,
        index: &OwnerTokenAccountIndex,
        pending: &mut PendingInstructions,
    ) -> SwapResult<Pubkey> {
        match *requirement {
            AccountRequirement::Existing(address) => {
                debug!(%address, ?role, "using caller-supplied account");
                Ok(address)
            }
            AccountRequirement::Associated { mint } => {
                self.resolve_associated(&mint, role, index, pending)
            }
            AccountRequirement::Owned { mint, lamports } => {
                self.create_owned(&mint, lamports, pending)
            }
        }
    }

    fn resolve_associated(
        &self,
        mint: &Pubkey,
        role: AccountRole,
        index: &OwnerTokenAccountIndex,
        pending: &mut PendingInstructions,
    ) -> SwapResult<Pubkey> {
        let (address, _) = derive_associated_address(
            &self.owner,
            mint,
            &token_program_id(),
            &associated_token_program_id(),
        )?;

        if index.get(mint).map(|account| account.address) == Some(address) {
            debug!(%address, %mint, "reusing canonical account");
            return Ok(address);
        }

        if role == AccountRole::Destination && *mint == native_mint() {
            return Err(SwapError::NativeMintNotWrapped);
        }

        if !pending.request_associated(address) {
            debug!(%address, %mint, "associated account already requested in this assembly");
            return Ok(address);
        }

        pending.push(create_associated_token_account(&self.owner, &self.owner, mint));
        Ok(address)
    }

    fn create_owned(
        &self,
        mint: &Pubkey,
        lamports: Option<u64>,
        pending: &mut PendingInstructions,
    ) -> SwapResult<Pubkey> {
        let lamports = match lamports {
            Some(lamports) => lamports,
            None => self
                .source
                .minimum_balance_for_rent_exemption(TOKEN_ACCOUNT_LEN)?,
        };

        let account = Keypair::new();
        let address = account.pubkey();

        pending.push(create_token_account(&self.owner, &address, lamports));
        pending.push(initialize_token_account(&address, mint, &self.owner)?);
        pending.add_signer(account);

        debug!(%address, %mint, lamports, "created one-time token account");
        Ok(address)
    }
}
