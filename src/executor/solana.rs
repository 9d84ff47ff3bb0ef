use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::str::FromStr;
use tracing::{debug, info};

use super::{ChainSigner, SubmitError, VaultCall};
use crate::error::{AgentError, Result};

/// Signs vault calls with a single authority keypair and waits for
/// confirmation on a Solana cluster.
pub struct SolanaVaultSigner {
    client: RpcClient,
    authority: Keypair,
    program_id: Pubkey,
}

impl SolanaVaultSigner {
    pub fn new(rpc_url: &str, program_id: &str, authority: Keypair) -> Result<Self> {
        let program_id = Pubkey::from_str(program_id).map_err(|e| {
            AgentError::config_error(format!("invalid vault program id {}: {}", program_id, e))
        })?;

        let client =
            RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());

        info!(
            "Vault signer ready: authority {}, program {}",
            authority.pubkey(),
            program_id
        );

        Ok(Self {
            client,
            authority,
            program_id,
        })
    }
}

#[async_trait]
impl ChainSigner for SolanaVaultSigner {
    async fn submit(&self, vault: &str, call: VaultCall) -> std::result::Result<String, SubmitError> {
        let vault = parse_pubkey("vault", vault)?;
        let ix = vault_instruction(&self.program_id, &self.authority.pubkey(), &vault, &call)?;

        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(classify_client_error)?;

        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&self.authority.pubkey()),
            &[&self.authority],
            blockhash,
        );

        debug!("Sending {} to vault {}", call.name(), vault);

        let signature = self
            .client
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(classify_client_error)?;

        Ok(signature.to_string())
    }
}

/// Builds the Anchor instruction for a vault call.
///
/// `set_target_weights(adapters: Vec<Pubkey>, weights: Vec<u16>)` passes every
/// adapter as a read-only account after the vault. `rebalance()` takes no args.
pub fn vault_instruction(
    program_id: &Pubkey,
    authority: &Pubkey,
    vault: &Pubkey,
    call: &VaultCall,
) -> std::result::Result<Instruction, SubmitError> {
    let mut accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(*vault, false),
    ];

    let data = match call {
        VaultCall::SetTargetWeights {
            adapters,
            weights_bps,
        } => {
            let adapter_keys = adapters
                .iter()
                .map(|a| parse_pubkey("adapter", a))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            accounts.extend(
                adapter_keys
                    .iter()
                    .map(|key| AccountMeta::new_readonly(*key, false)),
            );

            let mut data = anchor_discriminator("set_target_weights").to_vec();
            data.extend_from_slice(&(adapter_keys.len() as u32).to_le_bytes());
            for key in &adapter_keys {
                data.extend_from_slice(key.as_ref());
            }
            data.extend_from_slice(&(weights_bps.len() as u32).to_le_bytes());
            for weight in weights_bps {
                data.extend_from_slice(&weight.to_le_bytes());
            }
            data
        }
        VaultCall::Rebalance => anchor_discriminator("rebalance").to_vec(),
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// sha256("global:<name>")[0..8]
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    let digest = hash(format!("global:{}", name).as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest.to_bytes()[..8]);
    discriminator
}

fn parse_pubkey(what: &str, value: &str) -> std::result::Result<Pubkey, SubmitError> {
    Pubkey::from_str(value)
        .map_err(|e| SubmitError::Transport(format!("{} {} is not a valid address: {}", what, value, e)))
}

// A TransactionError means the cluster processed the transaction and it failed.
fn classify_client_error(err: ClientError) -> SubmitError {
    match err.get_transaction_error() {
        Some(tx_err) => SubmitError::Reverted(tx_err.to_string()),
        None => SubmitError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_client::client_error::ClientErrorKind;
    use solana_sdk::transaction::TransactionError;

    #[test]
    fn processed_failures_are_reverts_everything_else_transport() {
        let reverted = classify_client_error(ClientError::from(TransactionError::AccountNotFound));
        assert!(matches!(reverted, SubmitError::Reverted(_)));

        let transport = classify_client_error(ClientError::from(ClientErrorKind::Custom(
            "timeout".to_string(),
        )));
        assert!(matches!(transport, SubmitError::Transport(ref msg) if msg.contains("timeout")));
    }

    #[test]
    fn discriminator_matches_known_anchor_instruction() {
        assert_eq!(
            anchor_discriminator("deposit_reserve_liquidity"),
            [169, 201, 30, 126, 6, 205, 102, 68]
        );
    }

    #[test]
    fn set_target_weights_layout() {
        let program = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let a1 = Pubkey::new_unique();
        let a2 = Pubkey::new_unique();

        let call = VaultCall::SetTargetWeights {
            adapters: vec![a1.to_string(), a2.to_string()],
            weights_bps: vec![3000, 2500],
        };
        let ix = vault_instruction(&program, &authority, &vault, &call).unwrap();

        assert_eq!(ix.program_id, program);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(keys, vec![authority, vault, a1, a2]);
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[1].is_writable);
        assert!(!ix.accounts[2].is_writable);

        let mut expected = anchor_discriminator("set_target_weights").to_vec();
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(a1.as_ref());
        expected.extend_from_slice(a2.as_ref());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&3000u16.to_le_bytes());
        expected.extend_from_slice(&2500u16.to_le_bytes());
        assert_eq!(ix.data, expected);
    }

    #[test]
    fn rebalance_is_bare_discriminator() {
        let authority = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let ix = vault_instruction(&Pubkey::new_unique(), &authority, &vault, &VaultCall::Rebalance)
            .unwrap();
        assert_eq!(ix.data, anchor_discriminator("rebalance").to_vec());
        assert_eq!(ix.accounts.len(), 2);
    }

    #[test]
    fn placeholder_adapter_fails_before_sending() {
        let call = VaultCall::SetTargetWeights {
            adapters: vec!["0xADAPTER_aave-v3_USDC".to_string()],
            weights_bps: vec![3000],
        };
        let err = vault_instruction(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &call,
        )
        .unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
    }
}
