use crate::errors::FxError;
use crate::ports::Fx;
use shared_types::{Credential, OutputOwners};

/// Threshold-address authorization.
///
/// Credentials carry the addresses recovered from their signatures; this
/// checks them against the owner slots the input names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecpFx;

impl Fx for SecpFx {
    fn verify_permission(
        &self,
        owners: &OutputOwners,
        sig_indices: &[u32],
        credential: &Credential,
        now: u64,
    ) -> Result<(), FxError> {
        if owners.locktime > now {
            return Err(FxError::Locked {
                locktime: owners.locktime,
                now,
            });
        }
        if sig_indices.len() != owners.threshold as usize {
            return Err(FxError::WrongSignatureCount {
                expected: owners.threshold as usize,
                actual: sig_indices.len(),
            });
        }
        if credential.signers.len() != sig_indices.len() {
            return Err(FxError::SignerCountMismatch {
                signers: credential.signers.len(),
                indices: sig_indices.len(),
            });
        }
        for (position, (index, signer)) in sig_indices.iter().zip(&credential.signers).enumerate() {
            let owner = owners
                .addresses
                .get(*index as usize)
                .ok_or(FxError::IndexOutOfBounds {
                    index: *index,
                    addresses: owners.addresses.len(),
                })?;
            if owner != signer {
                return Err(FxError::WrongSigner { position });
            }
        }
        Ok(())
    }
}
