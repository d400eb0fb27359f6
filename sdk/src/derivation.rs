//! Associated account address derivation.
//!
//! Seeds: `[owner, token_program_id, mint, nonce]` under the associated token
//! program. The nonce is searched from 255 downward and the first candidate that
//! is not a point on the ed25519 curve wins, so the address has no private key.

use solana_program::pubkey::Pubkey;

use crate::constants::{associated_token_program_id, token_program_id};
use crate::error::{SwapError, SwapResult};

/// Derive the canonical associated address and its nonce.
pub fn derive_associated_address(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
    associated_program_id: &Pubkey,
) -> SwapResult<(Pubkey, u8)> {
    let mut nonce_seed = [0u8; 1];
    for nonce in (0..=u8::MAX).rev() {
        nonce_seed[0] = nonce;
        let seeds: [&[u8]; 4] = [
            owner.as_ref(),
            token_program_id.as_ref(),
            mint.as_ref(),
            &nonce_seed,
        ];
        // Err here means the candidate landed on the curve; try the next nonce.
        if let Ok(address) = Pubkey::create_program_address(&seeds, associated_program_id) {
            return Ok((address, nonce));
        }
    }
    Err(SwapError::DerivationExhausted)
}

/// Canonical associated token address under the default SPL programs.
pub fn find_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> SwapResult<Pubkey> {
    derive_associated_address(
        owner,
        mint,
        &token_program_id(),
        &associated_token_program_id(),
    )
    .map(|(address, _)| address)
}
