//! Spend verification.
//!
//! Unlocked value is accounted per asset. Value under a stakeable lock that
//! has not expired is accounted per `(asset, locktime, owner)`: locked
//! outputs must be backed by locked inputs of the same owner and locktime,
//! and any shortfall is paid from unlocked funds.

use crate::errors::ExecutorError;
use crate::ports::Fx;
use shared_types::{AssetId, Credential, Id, TransferableInput, TransferableOutput, Utxo};
use std::collections::BTreeMap;

type LockedAmounts = BTreeMap<(AssetId, u64, Id), u64>;

fn add(map_value: &mut u64, amount: u64) -> Result<(), ExecutorError> {
    *map_value = map_value
        .checked_add(amount)
        .ok_or(ExecutorError::Overflow)?;
    Ok(())
}

/// Checks that `ins` (spending `utxos`, authorised by `creds`) cover `outs`
/// plus `unlocked_produced`, the value burned or otherwise consumed per
/// asset.
///
/// `utxos`, `ins` and `creds` are parallel slices.
pub fn verify_spend(
    fx: &dyn Fx,
    utxos: &[Utxo],
    ins: &[TransferableInput],
    outs: &[TransferableOutput],
    creds: &[Credential],
    now: u64,
    mut unlocked_produced: BTreeMap<AssetId, u64>,
) -> Result<(), ExecutorError> {
    if utxos.len() != ins.len() {
        return Err(ExecutorError::CredentialCount {
            expected: ins.len(),
            actual: utxos.len(),
        });
    }
    if creds.len() != ins.len() {
        return Err(ExecutorError::CredentialCount {
            expected: ins.len(),
            actual: creds.len(),
        });
    }

    let mut consumed_unlocked: BTreeMap<AssetId, u64> = BTreeMap::new();
    let mut consumed_locked: LockedAmounts = BTreeMap::new();

    for ((utxo, input), cred) in utxos.iter().zip(ins).zip(creds) {
        let input_id = input.input_id();
        if utxo.asset_id != input.asset_id {
            return Err(ExecutorError::AssetMismatch {
                input_id,
                declared: input.asset_id,
                actual: utxo.asset_id,
            });
        }

        let out_locktime = utxo.output.stakeable_locktime();
        let locktime = if out_locktime > now { out_locktime } else { 0 };
        if input.input.stakeable_locktime() != locktime {
            return Err(ExecutorError::LocktimeMismatch { input_id });
        }

        let amount = input.input.amount();
        if amount != utxo.output.amount() {
            return Err(ExecutorError::AmountMismatch {
                input_id,
                declared: amount,
                actual: utxo.output.amount(),
            });
        }
        let owners = utxo.output.owners();
        fx.verify_permission(owners, &input.input.transfer().sig_indices, cred, now)?;

        if locktime == 0 {
            add(consumed_unlocked.entry(utxo.asset_id).or_default(), amount)?;
        } else {
            let key = (utxo.asset_id, locktime, owners.owner_id());
            add(consumed_locked.entry(key).or_default(), amount)?;
        }
    }

    let mut produced_locked: LockedAmounts = BTreeMap::new();
    for out in outs {
        let amount = out.output.amount();
        let locktime = out.output.stakeable_locktime();
        if locktime == 0 {
            add(unlocked_produced.entry(out.asset_id).or_default(), amount)?;
        } else {
            let key = (out.asset_id, locktime, out.output.owners().owner_id());
            add(produced_locked.entry(key).or_default(), amount)?;
        }
    }

    for (key, produced) in produced_locked {
        let consumed = consumed_locked.get(&key).copied().unwrap_or(0);
        if produced > consumed {
            add(
                unlocked_produced.entry(key.0).or_default(),
                produced - consumed,
            )?;
        }
    }

    for (asset_id, produced) in unlocked_produced {
        let consumed = consumed_unlocked.get(&asset_id).copied().unwrap_or(0);
        if produced > consumed {
            return Err(ExecutorError::InsufficientFunds {
                asset_id,
                consumed,
                produced,
            });
        }
    }
    Ok(())
}
