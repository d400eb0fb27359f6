//! AMM swap SDK: resolves the token accounts a swap touches, encodes the
//! pool swap instruction and assembles create, swap and close into one
//! atomic instruction list.

pub mod accounts;
pub mod amount;
pub mod assembler;
pub mod builder;
pub mod constants;
pub mod derivation;
pub mod error;
pub mod fees;
pub mod instruction;
pub mod pool;

pub use accounts::{
    AccountRequirement, AccountResolver, AccountRole, AccountSource, OwnerTokenAccountIndex,
    ResolvedAccount, TokenAccountRecord,
};
pub use amount::TokenAmount;
pub use assembler::{AssembledSwap, AssemblyOptions, FeeCollection, SwapAssembler, SwapRequest};
pub use builder::PendingInstructions;
pub use derivation::{derive_associated_address, find_associated_token_address};
pub use error::{SwapError, SwapResult};
pub use fees::Fees;
pub use instruction::{swap_instruction, AmmInstruction};
pub use pool::{PoolDescriptor, PoolKeys};
