//! `bridge_sol` instruction of the Base bridge program on Solana.

use std::sync::LazyLock;

use alloy::primitives::Address;
use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_sdk_ids::system_program;

/// Bridge program PDA seeds (must match the bridge program)
const BRIDGE_SEED: &[u8] = b"bridge";
const SOL_VAULT_SEED: &[u8] = b"sol_vault";
const OUTGOING_MESSAGE_SEED: &[u8] = b"outgoing_message";

/// Player PDA seed (must match the game program)
const PLAYER_SEED: &[u8] = b"player";

/// `Call.ty` for a plain `CALL` on Base.
pub const CALL_TYPE_CALL: u8 = 0;

static BRIDGE_SOL_DISCRIMINATOR: LazyLock<[u8; 8]> =
    LazyLock::new(|| anchor_discriminator("global:bridge_sol"));

fn anchor_discriminator(preimage: &str) -> [u8; 8] {
    let hash = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Call attached to a bridged transfer, as the bridge program stores it.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct BridgeCall {
    /// Call type, see [`CALL_TYPE_CALL`].
    pub ty: u8,
    /// Target contract on Base.
    pub to: [u8; 20],
    /// Wei sent with the call.
    pub value: u128,
    /// Calldata.
    pub data: Vec<u8>,
}

#[derive(BorshSerialize)]
struct BridgeSolArgs {
    outgoing_message_salt: [u8; 32],
    to: [u8; 20],
    remote_token: [u8; 20],
    amount: u64,
    gas_limit: u64,
    call: Option<BridgeCall>,
}

/// Everything needed to build a `bridge_sol` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSolParams {
    /// The Base bridge program.
    pub bridge_program: Pubkey,
    /// Receiver of the bridge gas fee.
    pub gas_fee_receiver: Pubkey,
    /// Pays fees and the bridged lamports.
    pub payer: Pubkey,
    /// Seed of the outgoing message account.
    pub salt: [u8; 32],
    /// Recipient on Base.
    pub to: Address,
    /// Bridged SOL ERC20 on Base.
    pub remote_token: Address,
    /// Lamports bridged.
    pub amount: u64,
    /// Execution gas on Base.
    pub gas_limit: u64,
    /// Call executed on Base once the transfer lands.
    pub call: Option<BridgeCall>,
}

/// Address of the outgoing message account created for `salt`.
#[must_use]
pub fn outgoing_message_pda(bridge_program: &Pubkey, salt: &[u8; 32]) -> Pubkey {
    Pubkey::find_program_address(&[OUTGOING_MESSAGE_SEED, salt], bridge_program).0
}

/// Address of the player account of `owner`, created by the one-time setup.
#[must_use]
pub fn player_pda(game_program: &Pubkey, owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[PLAYER_SEED, owner.as_ref()], game_program).0
}

/// Builds the `bridge_sol` instruction.
///
/// # Errors
/// Fails if the arguments cannot be Borsh-encoded.
pub fn bridge_sol(params: &BridgeSolParams) -> std::io::Result<Instruction> {
    let program = params.bridge_program;
    let (bridge_pda, _) = Pubkey::find_program_address(&[BRIDGE_SEED], &program);
    let (sol_vault_pda, _) = Pubkey::find_program_address(
        &[SOL_VAULT_SEED, params.remote_token.as_slice()],
        &program,
    );
    let outgoing_message = outgoing_message_pda(&program, &params.salt);

    // Account order must match the program's BridgeSol struct
    let accounts = vec![
        AccountMeta::new(params.payer, true),
        AccountMeta::new(params.payer, true),
        AccountMeta::new(params.gas_fee_receiver, false),
        AccountMeta::new(sol_vault_pda, false),
        AccountMeta::new(bridge_pda, false),
        AccountMeta::new(outgoing_message, false),
        AccountMeta::new_readonly(system_program::ID, false),
    ];

    let args = BridgeSolArgs {
        outgoing_message_salt: params.salt,
        to: params.to.into_array(),
        remote_token: params.remote_token.into_array(),
        amount: params.amount,
        gas_limit: params.gas_limit,
        call: params.call.clone(),
    };

    let mut data = BRIDGE_SOL_DISCRIMINATOR.to_vec();
    data.extend_from_slice(&borsh::to_vec(&args)?);

    Ok(Instruction {
        program_id: program,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(call: Option<BridgeCall>) -> BridgeSolParams {
        BridgeSolParams {
            bridge_program: Pubkey::new_unique(),
            gas_fee_receiver: Pubkey::new_unique(),
            payer: Pubkey::new_unique(),
            salt: [0x5a; 32],
            to: Address::repeat_byte(0x22),
            remote_token: Address::repeat_byte(0x44),
            amount: 1_000_000,
            gas_limit: 500_000,
            call,
        }
    }

    #[test]
    fn discriminator_is_anchor_sighash() {
        let hash = Sha256::digest(b"global:bridge_sol");
        assert_eq!(BRIDGE_SOL_DISCRIMINATOR.as_slice(), &hash[..8]);
    }

    #[test]
    fn encodes_args_after_discriminator() {
        let p = params(None);
        let ix = bridge_sol(&p).unwrap();

        assert_eq!(ix.program_id, p.bridge_program);
        assert_eq!(&ix.data[..8], BRIDGE_SOL_DISCRIMINATOR.as_slice());

        let args = &ix.data[8..];
        assert_eq!(&args[..32], &[0x5a; 32]);
        assert_eq!(&args[32..52], &[0x22; 20]);
        assert_eq!(&args[52..72], &[0x44; 20]);
        assert_eq!(&args[72..80], &1_000_000u64.to_le_bytes());
        assert_eq!(&args[80..88], &500_000u64.to_le_bytes());
        // Option::None
        assert_eq!(&args[88..], &[0]);
    }

    #[test]
    fn encodes_attached_call() {
        let call = BridgeCall {
            ty: CALL_TYPE_CALL,
            to: [0x66; 20],
            value: 0,
            data: vec![0xab, 0xcd],
        };
        let ix = bridge_sol(&params(Some(call))).unwrap();

        let call_bytes = &ix.data[8 + 88..];
        assert_eq!(call_bytes[0], 1);
        assert_eq!(call_bytes[1], CALL_TYPE_CALL);
        assert_eq!(&call_bytes[2..22], &[0x66; 20]);
        assert_eq!(&call_bytes[22..38], &[0u8; 16]);
        assert_eq!(&call_bytes[38..42], &2u32.to_le_bytes());
        assert_eq!(&call_bytes[42..], &[0xab, 0xcd]);
    }

    #[test]
    fn accounts_include_outgoing_message_pda() {
        let p = params(None);
        let ix = bridge_sol(&p).unwrap();

        let outgoing = outgoing_message_pda(&p.bridge_program, &p.salt);
        assert_eq!(ix.accounts[5].pubkey, outgoing);
        assert!(ix.accounts[5].is_writable);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[6].pubkey, system_program::ID);
    }

    #[test]
    fn pdas_depend_on_their_seeds() {
        let program = Pubkey::new_unique();
        assert_ne!(
            outgoing_message_pda(&program, &[1; 32]),
            outgoing_message_pda(&program, &[2; 32])
        );

        let game = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        assert_eq!(player_pda(&game, &owner), player_pda(&game, &owner));
        assert_ne!(player_pda(&game, &owner), player_pda(&game, &Pubkey::new_unique()));
    }
}
