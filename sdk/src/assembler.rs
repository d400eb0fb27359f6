//! Swap transaction assembly.
//!
//! Order of the produced instructions:
//!   1. create + initialize a temporary wrapped account (native input only)
//!   2. create the destination account when it does not exist yet
//!   3. swap
//!   4. platform fee transfer (optional)
//!   5. close temporary wrapped accounts back to the owner (always last)
//!
//! Nothing is sent anywhere. The result is handed to a signer/submitter, and
//! the chain applies all of it or none of it.

use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::signature::{Keypair, Signer};
use tracing::{info, warn};

use crate::accounts::{
    AccountRequirement, AccountResolver, AccountRole, AccountSource, OwnerTokenAccountIndex,
    TokenAccountRecord,
};
use crate::amount::TokenAmount;
use crate::builder::PendingInstructions;
use crate::constants::{
    native_mint, DEFAULT_WRAP_RESERVE_LAMPORTS, NATIVE_DECIMALS, TOKEN_ACCOUNT_LEN,
};
use crate::error::{SwapError, SwapResult};
use crate::fees::Fees;
use crate::instruction::{close_token_account, swap_instruction, transfer_tokens};
use crate::pool::PoolDescriptor;

#[derive(Clone, Debug)]
pub struct SwapRequest {
    pub owner: Pubkey,
    pub pool: PoolDescriptor,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount_in: TokenAmount,
    pub minimum_amount_out: TokenAmount,
    /// Use this source token account instead of the canonical one.
    pub source_account: Option<Pubkey>,
    /// Use this destination token account instead of resolving one.
    pub destination_account: Option<Pubkey>,
}

/// Fee charged on the guaranteed output, paid into `receiver` (a token
/// account for the output mint).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeCollection {
    pub receiver: Pubkey,
    pub fees: Fees,
}

#[derive(Clone, Debug)]
pub struct AssemblyOptions {
    /// Lamports added to a wrapped input on top of the swap amount. Raised to
    /// the rent-exempt minimum when lower.
    pub wrap_reserve_lamports: u64,
    pub fee: Option<FeeCollection>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            wrap_reserve_lamports: DEFAULT_WRAP_RESERVE_LAMPORTS,
            fee: None,
        }
    }
}

/// A complete swap, ready for signing by the owner plus `signers`.
#[derive(Debug)]
pub struct AssembledSwap {
    pub owner: Pubkey,
    pub instructions: Vec<Instruction>,
    /// One-time keypairs of accounts created in this transaction.
    pub signers: Vec<Keypair>,
    pub source_account: Pubkey,
    pub destination_account: Pubkey,
    /// Funded accounts that are not canonical, for display.
    pub auxiliary_accounts: Vec<TokenAccountRecord>,
    pub native_balance: u64,
}

impl AssembledSwap {
    /// Every key that must sign, owner (fee payer) first.
    pub fn required_signers(&self) -> Vec<Pubkey> {
        std::iter::once(self.owner)
            .chain(self.signers.iter().map(Keypair::pubkey))
            .collect()
    }
}

pub struct SwapAssembler<'a, S: AccountSource + ?Sized> {
    source: &'a S,
    options: AssemblyOptions,
}

impl<'a, S: AccountSource + ?Sized> SwapAssembler<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self::with_options(source, AssemblyOptions::default())
    }

    pub fn with_options(source: &'a S, options: AssemblyOptions) -> Self {
        Self { source, options }
    }

    pub fn assemble(&self, request: &SwapRequest) -> SwapResult<AssembledSwap> {
        let amount_in = request.amount_in.to_wire_units()?;
        let minimum_amount_out = request.minimum_amount_out.to_wire_units()?;
        if amount_in == 0 {
            return Err(SwapError::InvalidAmount("swap input must be positive".to_string()));
        }
        for (mint, amount) in [
            (&request.input_mint, &request.amount_in),
            (&request.output_mint, &request.minimum_amount_out),
        ] {
            if *mint == native_mint() && amount.decimals() != NATIVE_DECIMALS {
                return Err(SwapError::InvalidAmount(format!(
                    "native amounts carry {} decimals, got {}",
                    NATIVE_DECIMALS,
                    amount.decimals()
                )));
            }
        }
        request.pool.validate()?;
        if let Some(fee) = &self.options.fee {
            fee.fees.validate()?;
        }

        let owner = request.owner;
        let resolver = AccountResolver::new(self.source, owner);
        let mut pending = PendingInstructions::new();
        let mut temporary = Vec::with_capacity(2);

        let index = OwnerTokenAccountIndex::scan(self.source, &owner)?;

        // Wrap native input into a one-time account funded with the exact amount.
        let wrapped_source = if request.source_account.is_none()
            && request.input_mint == native_mint()
        {
            let rent = self
                .source
                .minimum_balance_for_rent_exemption(TOKEN_ACCOUNT_LEN)?;
            let reserve = self.options.wrap_reserve_lamports.max(rent);
            let lamports = amount_in
                .checked_add(reserve)
                .ok_or(SwapError::AmountOverflow)?;
            let address = resolver.resolve_or_create(
                &AccountRequirement::Owned {
                    mint: request.input_mint,
                    lamports: Some(lamports),
                },
                AccountRole::Source,
                &index,
                &mut pending,
            )?;
            temporary.push(address);
            Some(address)
        } else {
            None
        };

        let source_account = match (request.source_account, wrapped_source) {
            (Some(explicit), _) => explicit,
            (None, Some(wrapped)) => wrapped,
            (None, None) => {
                let canonical = index.get(&request.input_mint).ok_or_else(|| {
                    SwapError::AccountResolutionFailure(format!(
                        "owner {} has no canonical token account for input mint {}",
                        owner, request.input_mint
                    ))
                })?;
                if canonical.balance < amount_in {
                    warn!(
                        account = %canonical.address,
                        balance = canonical.balance,
                        amount_in,
                        "source balance is below the swap amount"
                    );
                }
                canonical.address
            }
        };

        let destination_requirement = match request.destination_account {
            Some(explicit) => AccountRequirement::Existing(explicit),
            None if request.output_mint == native_mint() => AccountRequirement::Owned {
                mint: request.output_mint,
                lamports: None,
            },
            None => AccountRequirement::Associated {
                mint: request.output_mint,
            },
        };
        let destination_account = resolver.resolve_or_create(
            &destination_requirement,
            AccountRole::Destination,
            &index,
            &mut pending,
        )?;
        if matches!(destination_requirement, AccountRequirement::Owned { .. }) {
            temporary.push(destination_account);
        }

        pending.push(swap_instruction(
            &request.pool,
            &source_account,
            &destination_account,
            &owner,
            &request.amount_in,
            &request.minimum_amount_out,
        )?);

        if let Some(fee) = &self.options.fee {
            let amount = fee
                .fees
                .trading_fee(u128::from(minimum_amount_out))
                .and_then(|fee| u64::try_from(fee).ok())
                .ok_or(SwapError::InvalidFee)?;
            if amount > 0 {
                pending.push(transfer_tokens(
                    &destination_account,
                    &fee.receiver,
                    &owner,
                    amount,
                )?);
            }
        }

        for account in &temporary {
            pending.push(close_token_account(account, &owner, &owner)?);
        }

        let (instructions, signers) = pending.into_parts();
        info!(
            %owner,
            input_mint = %request.input_mint,
            output_mint = %request.output_mint,
            amount_in,
            minimum_amount_out,
            instructions = instructions.len(),
            signers = signers.len() + 1,
            "assembled swap"
        );

        Ok(AssembledSwap {
            owner,
            instructions,
            signers,
            source_account,
            destination_account,
            auxiliary_accounts: index.auxiliary().to_vec(),
            native_balance: index.native_balance(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::tests::{MockSource, RENT_EXEMPT_TOKEN_ACCOUNT};
    use crate::derivation::find_associated_token_address;
    use crate::pool::tests::mock_pool;
    use rust_decimal_macros::dec;

    fn request(owner: Pubkey, input_mint: Pubkey, output_mint: Pubkey) -> SwapRequest {
        SwapRequest {
            owner,
            pool: mock_pool(),
            input_mint,
            output_mint,
            amount_in: TokenAmount::from_ui(dec!(0.0001), 9).unwrap(),
            minimum_amount_out: TokenAmount::from_ui(dec!(0.016185), 6).unwrap(),
            source_account: None,
            destination_account: None,
        }
    }

    #[test]
    fn test_wrap_reserve_raised_to_rent_minimum() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let options = AssemblyOptions {
            wrap_reserve_lamports: 1,
            fee: None,
        };
        let swap = SwapAssembler::with_options(&source, options)
            .assemble(&request(owner, native_mint(), Pubkey::new_unique()))
            .unwrap();

        // system create_account data: [u32 tag][u64 lamports][u64 space][owner]
        let create = &swap.instructions[0];
        let lamports = u64::from_le_bytes(create.data[4..12].try_into().unwrap());
        assert_eq!(lamports, 100_000 + RENT_EXEMPT_TOKEN_ACCOUNT);
    }

    #[test]
    fn test_default_wrap_reserve() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let swap = SwapAssembler::new(&source)
            .assemble(&request(owner, native_mint(), Pubkey::new_unique()))
            .unwrap();

        let create = &swap.instructions[0];
        let lamports = u64::from_le_bytes(create.data[4..12].try_into().unwrap());
        assert_eq!(lamports, 100_000 + DEFAULT_WRAP_RESERVE_LAMPORTS);
    }

    #[test]
    fn test_missing_token_source_fails() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let mut req = request(owner, Pubkey::new_unique(), native_mint());
        req.minimum_amount_out = TokenAmount::from_ui(dec!(0.003), 9).unwrap();
        let err = SwapAssembler::new(&source).assemble(&req).unwrap_err();
        assert!(matches!(err, SwapError::AccountResolutionFailure(_)));
    }

    #[test]
    fn test_native_amount_requires_nine_decimals() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let mut req = request(owner, native_mint(), Pubkey::new_unique());
        req.amount_in = TokenAmount::from_ui(dec!(0.0001), 6).unwrap();
        let err = SwapAssembler::new(&source).assemble(&req).unwrap_err();
        assert!(matches!(err, SwapError::InvalidAmount(_)));
    }

    #[test]
    fn test_zero_input_rejected() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let mut req = request(owner, native_mint(), Pubkey::new_unique());
        req.amount_in = TokenAmount::from_base_units(0, 9).unwrap();
        let err = SwapAssembler::new(&source).assemble(&req).unwrap_err();
        assert!(matches!(err, SwapError::InvalidAmount(_)));
    }

    #[test]
    fn test_fee_transfer_before_close() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let receiver = Pubkey::new_unique();
        let options = AssemblyOptions {
            fee: Some(FeeCollection {
                receiver,
                fees: Fees {
                    trade_fee_numerator: 1,
                    trade_fee_denominator: 10,
                    ..Fees::default()
                },
            }),
            ..AssemblyOptions::default()
        };
        let usdc = Pubkey::new_unique();
        let swap = SwapAssembler::with_options(&source, options)
            .assemble(&request(owner, native_mint(), usdc))
            .unwrap();

        // create, init, create ata, swap, fee, close
        assert_eq!(swap.instructions.len(), 6);
        let fee = &swap.instructions[4];
        assert_eq!(fee.program_id, spl_token::id());
        assert_eq!(fee.accounts[0].pubkey, swap.destination_account);
        assert_eq!(fee.accounts[1].pubkey, receiver);
        // transfer data: [tag=3][u64 amount]
        assert_eq!(fee.data[0], 3);
        assert_eq!(u64::from_le_bytes(fee.data[1..9].try_into().unwrap()), 1_618);
    }

    #[test]
    fn test_invalid_fee_rejected_before_building() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let options = AssemblyOptions {
            fee: Some(FeeCollection {
                receiver: Pubkey::new_unique(),
                fees: Fees {
                    trade_fee_numerator: 2,
                    trade_fee_denominator: 1,
                    ..Fees::default()
                },
            }),
            ..AssemblyOptions::default()
        };
        let err = SwapAssembler::with_options(&source, options)
            .assemble(&request(owner, native_mint(), Pubkey::new_unique()))
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidFee));
    }

    #[test]
    fn test_explicit_accounts_skip_resolution() {
        let owner = Pubkey::new_unique();
        let source = MockSource::default();
        let mut req = request(owner, native_mint(), Pubkey::new_unique());
        let explicit_source = Pubkey::new_unique();
        let explicit_dest = Pubkey::new_unique();
        req.source_account = Some(explicit_source);
        req.destination_account = Some(explicit_dest);

        let swap = SwapAssembler::new(&source).assemble(&req).unwrap();
        assert_eq!(swap.instructions.len(), 1);
        assert_eq!(swap.source_account, explicit_source);
        assert_eq!(swap.destination_account, explicit_dest);
        assert_eq!(swap.required_signers(), vec![owner]);
    }

    #[test]
    fn test_token_to_native_unwraps_output() {
        let owner = Pubkey::new_unique();
        let usdc = Pubkey::new_unique();
        let usdc_account = find_associated_token_address(&owner, &usdc).unwrap();
        let source = MockSource {
            accounts: vec![TokenAccountRecord {
                address: usdc_account,
                mint: usdc,
                owner,
                amount: 1_000_000,
            }],
            ..MockSource::default()
        };
        let mut req = request(owner, usdc, native_mint());
        req.amount_in = TokenAmount::from_ui(dec!(0.5), 6).unwrap();
        req.minimum_amount_out = TokenAmount::from_ui(dec!(0.003), 9).unwrap();

        let swap = SwapAssembler::new(&source).assemble(&req).unwrap();

        // create temp wsol, init, swap, close
        assert_eq!(swap.instructions.len(), 4);
        assert_eq!(swap.source_account, usdc_account);
        assert_ne!(swap.destination_account, usdc_account);
        let close = swap.instructions.last().unwrap();
        assert_eq!(close.accounts[0].pubkey, swap.destination_account);
        assert_eq!(close.accounts[1].pubkey, owner);
        assert_eq!(source.rent_reads.get(), 1);
        assert_eq!(swap.signers.len(), 1);
    }
}
