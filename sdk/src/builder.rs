//! Append-only instruction list threaded through one swap assembly.

use std::collections::HashSet;

use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::signature::{Keypair, Signer};
use tracing::debug;

/// Instructions in execution order, the one-time keypairs that must co-sign
/// them, and the associated addresses already scheduled for creation.
#[derive(Default)]
pub struct PendingInstructions {
    instructions: Vec<Instruction>,
    signers: Vec<Keypair>,
    requested_associated: HashSet<Pubkey>,
}

impl PendingInstructions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        debug!(
            index = self.instructions.len(),
            program = %instruction.program_id,
            accounts = instruction.accounts.len(),
            "append instruction"
        );
        self.instructions.push(instruction);
    }

    pub fn add_signer(&mut self, keypair: Keypair) {
        self.signers.push(keypair);
    }

    /// Record that `address` gets a create instruction. Returns false when it
    /// was already requested in this assembly.
    pub fn request_associated(&mut self, address: Pubkey) -> bool {
        self.requested_associated.insert(address)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn signer_pubkeys(&self) -> Vec<Pubkey> {
        self.signers.iter().map(Keypair::pubkey).collect()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Instruction>, Vec<Keypair>) {
        (self.instructions, self.signers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_associated_once() {
        let mut pending = PendingInstructions::new();
        let address = Pubkey::new_unique();

        assert!(pending.request_associated(address));
        assert!(!pending.request_associated(address));
        assert!(pending.request_associated(Pubkey::new_unique()));
    }

    #[test]
    fn test_into_parts_preserves_order() {
        let mut pending = PendingInstructions::new();
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();
        pending.push(Instruction::new_with_bytes(first, &[], vec![]));
        pending.push(Instruction::new_with_bytes(second, &[], vec![]));

        let keypair = Keypair::new();
        let signer = keypair.pubkey();
        pending.add_signer(keypair);
        assert_eq!(pending.signer_pubkeys(), vec![signer]);

        let (instructions, signers) = pending.into_parts();
        assert_eq!(instructions[0].program_id, first);
        assert_eq!(instructions[1].program_id, second);
        assert_eq!(signers.len(), 1);
    }
}
