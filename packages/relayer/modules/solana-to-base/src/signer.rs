//! Holders of the source-chain key.

use std::path::Path;

use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::Signer,
    transaction::Transaction,
};

/// Signs bridge transactions for the bound account.
pub trait WalletSigner: Send + Sync {
    /// The bound account.
    fn pubkey(&self) -> Pubkey;

    /// Signs `tx` against `blockhash`.
    ///
    /// # Errors
    /// Fails if the holder refuses or cannot sign.
    fn sign_transaction(&self, tx: &mut Transaction, blockhash: Hash) -> anyhow::Result<()>;
}

/// [`WalletSigner`] holding a local keypair.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    /// Create a new [`KeypairSigner`] instance.
    #[must_use]
    pub const fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Loads a keypair from a Solana CLI JSON keypair file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let keypair = read_keypair_file(path)
            .map_err(|e| anyhow::anyhow!("failed to read keypair {}: {e}", path.display()))?;
        Ok(Self::new(keypair))
    }
}

impl WalletSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_transaction(&self, tx: &mut Transaction, blockhash: Hash) -> anyhow::Result<()> {
        tx.try_sign(&[&self.keypair], blockhash)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::Instruction, signature::Signature};

    #[test]
    fn signs_as_fee_payer() {
        let signer = KeypairSigner::new(Keypair::new());
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[1, 2, 3], vec![]);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&signer.pubkey()));

        signer
            .sign_transaction(&mut tx, Hash::new_unique())
            .unwrap();

        assert!(tx.is_signed());
        assert_ne!(tx.signatures[0], Signature::default());
    }

    #[test]
    fn missing_keypair_file_is_an_error() {
        let err = KeypairSigner::from_file(Path::new("/nonexistent/id.json"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/id.json"));
    }
}
