//! Historical validator sets.
//!
//! The current set is kept in memory; older sets are rebuilt by undoing the
//! recorded weight diffs from the last accepted height down to the
//! requested one. Rebuilt sets are cached per `(subnet, height)`.

use super::persist::WEIGHT_DIFFS;
use super::State;
use crate::domain::{parse_weight_diff_key, weight_diff_prefix, ValidatorWeightDiff};
use crate::errors::LedgerError;
use pc_01_keyed_store::{DbError, KeyedStore};
use shared_types::{NodeId, SubnetId};
use std::collections::BTreeMap;
use tracing::trace;

impl State {
    /// Weight of every current validator of `subnet_id`, delegations
    /// included.
    pub fn current_validator_set(&self, subnet_id: SubnetId) -> BTreeMap<NodeId, u64> {
        self.current.subnet_weights(subnet_id)
    }

    /// Net weight changes recorded when `height` was accepted.
    pub fn weight_diffs_at(
        &self,
        subnet_id: SubnetId,
        height: u64,
    ) -> Result<BTreeMap<NodeId, ValidatorWeightDiff>, LedgerError> {
        let mut diffs = BTreeMap::new();
        for (key, value) in self
            .table(WEIGHT_DIFFS)
            .prefix_scan(&weight_diff_prefix(subnet_id, height))?
        {
            let (_, _, node_id) = parse_weight_diff_key(&key)
                .ok_or_else(|| DbError::corrupted(&key, "weight diff key"))?;
            diffs.insert(node_id, self.codec.unmarshal(&value)?);
        }
        Ok(diffs)
    }

    /// Net weight change of one validator over heights `(from, to]`.
    pub fn weight_diff_between(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
        from: u64,
        to: u64,
    ) -> Result<ValidatorWeightDiff, LedgerError> {
        let mut total = ValidatorWeightDiff::default();
        for height in from.saturating_add(1)..=to {
            if let Some(diff) = self.weight_diffs_at(subnet_id, height)?.get(&node_id) {
                total.add(diff.decrease, diff.amount)?;
            }
        }
        Ok(total)
    }

    /// Validator set of `subnet_id` as of accepted `height`.
    ///
    /// Reflects committed data only; call it with no staged changes.
    pub fn validator_set_at(
        &self,
        subnet_id: SubnetId,
        height: u64,
    ) -> Result<BTreeMap<NodeId, u64>, LedgerError> {
        if height > self.height {
            return Err(LedgerError::HeightUnavailable {
                requested: height,
                current: self.height,
            });
        }
        if height == self.height {
            return Ok(self.current_validator_set(subnet_id));
        }
        if let Some(set) = self.validator_sets.lock().get(&(subnet_id, height)) {
            return Ok(set.clone());
        }

        let mut set = self.current_validator_set(subnet_id);
        for h in (height + 1..=self.height).rev() {
            for (node_id, diff) in self.weight_diffs_at(subnet_id, h)? {
                let weight = set.get(&node_id).copied().unwrap_or(0);
                let before = diff
                    .undo(weight)
                    .ok_or(LedgerError::WeightUnderflow { node_id, height: h })?;
                if before == 0 {
                    set.remove(&node_id);
                } else {
                    set.insert(node_id, before);
                }
            }
        }
        trace!(%subnet_id, height, validators = set.len(), "rebuilt validator set");
        self.validator_sets
            .lock()
            .put((subnet_id, height), set.clone());
        Ok(set)
    }
}
