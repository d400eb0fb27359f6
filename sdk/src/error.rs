use solana_program::program_error::ProgramError;

/// Every way assembling a swap can fail. Nothing is returned to the caller
/// alongside an error: a failed assembly leaves no partial instruction list.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount exceeds the u64 wire range")]
    AmountOverflow,
    #[error("No off-curve program address found for the seed set")]
    DerivationExhausted,
    #[error("Account resolution failed: {0}")]
    AccountResolutionFailure(String),
    #[error("Pool descriptor is missing or has an invalid account: {0}")]
    UnknownPoolAccount(String),
    #[error("Native mint accounts must be wrapped with exact funding, not auto-created")]
    NativeMintNotWrapped,
    #[error("Invalid fee fraction")]
    InvalidFee,
    #[error("Invalid instruction data")]
    InvalidInstruction,
    #[error("Token program rejected instruction inputs: {0}")]
    Program(#[from] ProgramError),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] std::io::Error),
}

pub type SwapResult<T> = Result<T, SwapError>;
