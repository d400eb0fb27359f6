//! Program IDs, instruction tags, account layout sizes and default assembly values.

use solana_program::{program_pack::Pack, pubkey::Pubkey};

// ── Program IDs ─────────────────────────────────────────────────────────────

/// Liquidity pool program (AMM v4) that settles swaps against the order book.
pub const LIQUIDITY_POOL_PROGRAM_ID_V4: Pubkey =
    solana_program::pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

/// Order-book (DEX v3) program paired with the liquidity pool.
pub const SERUM_PROGRAM_ID_V3: Pubkey =
    solana_program::pubkey!("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin");

/// SPL Token program, owner of every token account this crate creates.
pub fn token_program_id() -> Pubkey {
    spl_token::id()
}

/// Associated Token Account program, the derivation namespace of canonical accounts.
pub fn associated_token_program_id() -> Pubkey {
    spl_associated_token_account::id()
}

/// Mint of the wrapped native asset.
pub fn native_mint() -> Pubkey {
    spl_token::native_mint::id()
}

// ── Instruction Tags ────────────────────────────────────────────────────────

/// Tag of the swap instruction in the pool program's instruction set.
pub const IX_SWAP: u8 = 9;

/// Tag of the deposit instruction.
pub const IX_DEPOSIT: u8 = 3;

/// Swap payload: tag + amount_in + minimum_amount_out.
pub const SWAP_DATA_LEN: usize = 1 + 8 + 8;

/// Deposit payload: tag + max_coin + max_pc + base_side.
pub const DEPOSIT_DATA_LEN: usize = 1 + 8 + 8 + 8;

/// Account references the swap instruction carries.
pub const SWAP_ACCOUNTS_LEN: usize = 19;

/// Account references the deposit instruction carries.
pub const DEPOSIT_ACCOUNTS_LEN: usize = 13;

/// Addresses a complete pool descriptor holds.
pub const POOL_ACCOUNTS_LEN: usize = 16;

// ── Amounts ─────────────────────────────────────────────────────────────────

/// Largest decimal exponent whose scale (10^19) still fits the u64 wire range.
pub const MAX_DECIMALS: u8 = 19;

/// Native asset decimals (lamports per whole unit = 10^9).
pub const NATIVE_DECIMALS: u8 = 9;

/// Byte length of an SPL token account (165).
pub const TOKEN_ACCOUNT_LEN: usize = spl_token::state::Account::LEN;

/// Default lamports added on top of the wrapped amount (0.01 native units).
pub const DEFAULT_WRAP_RESERVE_LAMPORTS: u64 = 10_000_000;
