//! Instruction builders: pool swap/deposit plus the token and system program
//! calls that create, initialize and close the accounts a swap touches.
//!
//! Pool instructions:
//!   3 = Deposit
//!   9 = Swap
//!
//! The pool program reads its accounts positionally, in the order of the
//! `Accounts:` lists below.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_instruction,
};

use crate::amount::TokenAmount;
use crate::constants::*;
use crate::error::{SwapError, SwapResult};
use crate::pool::PoolDescriptor;

// ── Param Structs (exact little-endian layout, no padding) ──────────────────

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapInstruction {
    /// Source amount to transfer; output is priced by the pool.
    pub amount_in: u64,
    /// Minimum destination amount, the slippage bound.
    pub minimum_amount_out: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepositInstruction {
    pub max_coin_amount: u64,
    pub max_pc_amount: u64,
    pub base_side: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmmInstruction {
    Deposit(DepositInstruction),
    Swap(SwapInstruction),
}

impl AmmInstruction {
    pub fn unpack(input: &[u8]) -> SwapResult<Self> {
        let (&tag, rest) = input.split_first().ok_or(SwapError::InvalidInstruction)?;
        match tag {
            IX_SWAP => SwapInstruction::try_from_slice(rest)
                .map(Self::Swap)
                .map_err(|_| SwapError::InvalidInstruction),
            IX_DEPOSIT => DepositInstruction::try_from_slice(rest)
                .map(Self::Deposit)
                .map_err(|_| SwapError::InvalidInstruction),
            _ => Err(SwapError::InvalidInstruction),
        }
    }

    pub fn pack(&self) -> SwapResult<Vec<u8>> {
        let data = match self {
            Self::Swap(args) => {
                let mut data = Vec::with_capacity(SWAP_DATA_LEN);
                data.push(IX_SWAP);
                args.serialize(&mut data)?;
                data
            }
            Self::Deposit(args) => {
                let mut data = Vec::with_capacity(DEPOSIT_DATA_LEN);
                data.push(IX_DEPOSIT);
                args.serialize(&mut data)?;
                data
            }
        };
        Ok(data)
    }
}

// ── Pool Instruction Builders ───────────────────────────────────────────────

/// Swap through the pool and its order-book market.
///
/// Accounts:
///   0. `[]` token_program
///   1. `[]` amm program
///   2. `[writable]` amm
///   3. `[]` amm authority
///   4. `[writable]` amm open_orders
///   5. `[writable]` amm target_orders
///   6. `[writable]` pool coin token account
///   7. `[writable]` pool pc token account
///   8. `[]` serum program
///   9. `[writable]` serum market
///  10. `[writable]` serum bids
///  11. `[writable]` serum asks
///  12. `[writable]` serum event queue
///  13. `[writable]` serum coin vault
///  14. `[writable]` serum pc vault
///  15. `[]` serum vault signer
///  16. `[writable]` user source token account
///  17. `[writable]` user destination token account
///  18. `[signer]` user owner
pub fn swap_instruction(
    pool: &PoolDescriptor,
    user_source_token_account: &Pubkey,
    user_destination_token_account: &Pubkey,
    user_owner: &Pubkey,
    amount_in: &TokenAmount,
    minimum_amount_out: &TokenAmount,
) -> SwapResult<Instruction> {
    let args = SwapInstruction {
        amount_in: amount_in.to_wire_units()?,
        minimum_amount_out: minimum_amount_out.to_wire_units()?,
    };
    pool.validate()?;

    let data = AmmInstruction::Swap(args).pack()?;

    let accounts = vec![
        // spl token
        AccountMeta::new_readonly(token_program_id(), false),
        AccountMeta::new_readonly(pool.amm_program_id, false),
        // amm
        AccountMeta::new(pool.amm_id, false),
        AccountMeta::new_readonly(pool.amm_authority, false),
        AccountMeta::new(pool.amm_open_orders, false),
        AccountMeta::new(pool.amm_target_orders, false),
        AccountMeta::new(pool.pool_coin_token_account, false),
        AccountMeta::new(pool.pool_pc_token_account, false),
        // serum
        AccountMeta::new_readonly(pool.serum_program_id, false),
        AccountMeta::new(pool.serum_market, false),
        AccountMeta::new(pool.serum_bids, false),
        AccountMeta::new(pool.serum_asks, false),
        AccountMeta::new(pool.serum_event_queue, false),
        AccountMeta::new(pool.serum_coin_vault_account, false),
        AccountMeta::new(pool.serum_pc_vault_account, false),
        AccountMeta::new_readonly(pool.serum_vault_signer, false),
        // user
        AccountMeta::new(*user_source_token_account, false),
        AccountMeta::new(*user_destination_token_account, false),
        AccountMeta::new_readonly(*user_owner, true),
    ];
    debug_assert_eq!(accounts.len(), SWAP_ACCOUNTS_LEN);

    Ok(Instruction {
        program_id: pool.router_program_id,
        accounts,
        data,
    })
}

/// Deposit both sides into the pool directly (sent to the amm program).
///
/// Accounts:
///   0. `[]` token_program
///   1. `[writable]` amm
///   2. `[]` amm authority
///   3. `[]` amm open_orders
///   4. `[writable]` amm target_orders
///   5. `[writable]` pool lp mint
///   6. `[writable]` pool coin token account
///   7. `[writable]` pool pc token account
///   8. `[]` serum market
///   9. `[writable]` user coin token account
///  10. `[writable]` user pc token account
///  11. `[writable]` user lp token account
///  12. `[signer]` user owner
#[allow(clippy::too_many_arguments)]
pub fn deposit_instruction(
    pool: &PoolDescriptor,
    lp_mint: &Pubkey,
    user_coin_token_account: &Pubkey,
    user_pc_token_account: &Pubkey,
    user_lp_token_account: &Pubkey,
    user_owner: &Pubkey,
    max_coin_amount: &TokenAmount,
    max_pc_amount: &TokenAmount,
    base_side: u64,
) -> SwapResult<Instruction> {
    let args = DepositInstruction {
        max_coin_amount: max_coin_amount.to_wire_units()?,
        max_pc_amount: max_pc_amount.to_wire_units()?,
        base_side,
    };
    pool.validate()?;
    if *lp_mint == Pubkey::default() {
        return Err(SwapError::UnknownPoolAccount("lpMint".to_string()));
    }

    let data = AmmInstruction::Deposit(args).pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(token_program_id(), false),
        AccountMeta::new(pool.amm_id, false),
        AccountMeta::new_readonly(pool.amm_authority, false),
        AccountMeta::new_readonly(pool.amm_open_orders, false),
        AccountMeta::new(pool.amm_target_orders, false),
        AccountMeta::new(*lp_mint, false),
        AccountMeta::new(pool.pool_coin_token_account, false),
        AccountMeta::new(pool.pool_pc_token_account, false),
        AccountMeta::new_readonly(pool.serum_market, false),
        AccountMeta::new(*user_coin_token_account, false),
        AccountMeta::new(*user_pc_token_account, false),
        AccountMeta::new(*user_lp_token_account, false),
        AccountMeta::new_readonly(*user_owner, true),
    ];
    debug_assert_eq!(accounts.len(), DEPOSIT_ACCOUNTS_LEN);

    Ok(Instruction {
        program_id: pool.amm_program_id,
        accounts,
        data,
    })
}

// ── Account Lifecycle Builders ──────────────────────────────────────────────

/// Allocate a token-account-sized system account owned by the token program.
pub fn create_token_account(funder: &Pubkey, new_account: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::create_account(
        funder,
        new_account,
        lamports,
        TOKEN_ACCOUNT_LEN as u64,
        &token_program_id(),
    )
}

pub fn initialize_token_account(
    account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
) -> SwapResult<Instruction> {
    Ok(spl_token::instruction::initialize_account(
        &token_program_id(),
        account,
        mint,
        owner,
    )?)
}

/// Create the owner's associated account. Succeeds on-chain even if the
/// account appeared after the owner's accounts were scanned.
pub fn create_associated_token_account(funder: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account_idempotent(
        funder,
        owner,
        mint,
        &token_program_id(),
    )
}

/// Close a token account, sending its lamports (and unwrapped native balance) to `destination`.
pub fn close_token_account(
    account: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
) -> SwapResult<Instruction> {
    Ok(spl_token::instruction::close_account(
        &token_program_id(),
        account,
        destination,
        owner,
        &[],
    )?)
}

pub fn transfer_tokens(
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> SwapResult<Instruction> {
    Ok(spl_token::instruction::transfer(
        &token_program_id(),
        source,
        destination,
        owner,
        &[],
        amount,
    )?)
}
