//! # Staker Sets
//!
//! [`BaseStakers`] is a materialized set (the committed base, one per
//! pending/current collection). [`DiffStakers`] records changes on top of a
//! parent set without copying it.

use super::Staker;
use shared_types::{NodeId, SubnetId, TxId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Debug, Default)]
struct BaseStaker {
    validator: Option<Staker>,
    delegators: BTreeSet<Staker>,
}

impl BaseStaker {
    fn is_empty(&self) -> bool {
        self.validator.is_none() && self.delegators.is_empty()
    }
}

/// Validators and delegators indexed per `(subnet, node)` plus one global
/// ordered set.
#[derive(Clone, Debug, Default)]
pub struct BaseStakers {
    validators: HashMap<SubnetId, HashMap<NodeId, BaseStaker>>,
    stakers: BTreeSet<Staker>,
}

impl BaseStakers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_validator(&self, subnet_id: SubnetId, node_id: NodeId) -> Option<&Staker> {
        self.validators
            .get(&subnet_id)?
            .get(&node_id)?
            .validator
            .as_ref()
    }

    pub fn put_validator(&mut self, staker: Staker) {
        let entry = self
            .validators
            .entry(staker.subnet_id)
            .or_default()
            .entry(staker.node_id)
            .or_default();
        if let Some(old) = entry.validator.replace(staker.clone()) {
            self.stakers.remove(&old);
        }
        self.stakers.insert(staker);
    }

    /// Returns `false` when no validator is registered for the staker's node.
    pub fn delete_validator(&mut self, staker: &Staker) -> bool {
        let Some(nodes) = self.validators.get_mut(&staker.subnet_id) else {
            return false;
        };
        let Some(entry) = nodes.get_mut(&staker.node_id) else {
            return false;
        };
        let Some(old) = entry.validator.take() else {
            return false;
        };
        self.stakers.remove(&old);
        if entry.is_empty() {
            nodes.remove(&staker.node_id);
            if nodes.is_empty() {
                self.validators.remove(&staker.subnet_id);
            }
        }
        true
    }

    /// Delegators of the node in staker order.
    pub fn get_delegators(&self, subnet_id: SubnetId, node_id: NodeId) -> Vec<Staker> {
        self.validators
            .get(&subnet_id)
            .and_then(|nodes| nodes.get(&node_id))
            .map(|entry| entry.delegators.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn put_delegator(&mut self, staker: Staker) {
        let entry = self
            .validators
            .entry(staker.subnet_id)
            .or_default()
            .entry(staker.node_id)
            .or_default();
        entry.delegators.insert(staker.clone());
        self.stakers.insert(staker);
    }

    pub fn delete_delegator(&mut self, staker: &Staker) -> bool {
        let Some(nodes) = self.validators.get_mut(&staker.subnet_id) else {
            return false;
        };
        let Some(entry) = nodes.get_mut(&staker.node_id) else {
            return false;
        };
        if !entry.delegators.remove(staker) {
            return false;
        }
        self.stakers.remove(staker);
        if entry.is_empty() {
            nodes.remove(&staker.node_id);
            if nodes.is_empty() {
                self.validators.remove(&staker.subnet_id);
            }
        }
        true
    }

    /// Every staker in `(next_time, priority, tx_id)` order.
    pub fn stakers(&self) -> impl Iterator<Item = &Staker> {
        self.stakers.iter()
    }

    /// Validators of one subnet, each with its delegated weight.
    pub fn subnet_weights(&self, subnet_id: SubnetId) -> BTreeMap<NodeId, u64> {
        let mut weights = BTreeMap::new();
        if let Some(nodes) = self.validators.get(&subnet_id) {
            for (node_id, entry) in nodes {
                let Some(validator) = &entry.validator else {
                    continue;
                };
                let delegated: u64 = entry
                    .delegators
                    .iter()
                    .fold(0u64, |acc, d| acc.saturating_add(d.weight));
                weights.insert(*node_id, validator.weight.saturating_add(delegated));
            }
        }
        weights
    }

    pub fn len(&self) -> usize {
        self.stakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakers.is_empty()
    }
}

/// Changes to one `(subnet, node)` entry.
///
/// A validator replaced within one diff keeps both sides: `deleted` is the
/// parent's validator and `added` its replacement.
#[derive(Clone, Debug, Default)]
pub struct DiffValidator {
    pub added: Option<Staker>,
    pub deleted: Option<Staker>,
    pub added_delegators: BTreeSet<Staker>,
    pub deleted_delegators: BTreeMap<TxId, Staker>,
}

/// Changes layered over a parent staker set.
#[derive(Clone, Debug, Default)]
pub struct DiffStakers {
    validator_diffs: BTreeMap<SubnetId, BTreeMap<NodeId, DiffValidator>>,
    added_stakers: BTreeSet<Staker>,
    deleted_stakers: HashMap<TxId, Staker>,
}

/// Outcome of a validator lookup in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLookup {
    Added(Staker),
    Deleted,
    /// Ask the parent.
    Unmodified,
}

impl DiffStakers {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, subnet_id: SubnetId, node_id: NodeId) -> &mut DiffValidator {
        self.validator_diffs
            .entry(subnet_id)
            .or_default()
            .entry(node_id)
            .or_default()
    }

    pub fn get_validator(&self, subnet_id: SubnetId, node_id: NodeId) -> DiffLookup {
        let diff = self
            .validator_diffs
            .get(&subnet_id)
            .and_then(|nodes| nodes.get(&node_id));
        match diff {
            Some(DiffValidator {
                added: Some(v), ..
            }) => DiffLookup::Added(v.clone()),
            Some(DiffValidator {
                deleted: Some(_), ..
            }) => DiffLookup::Deleted,
            _ => DiffLookup::Unmodified,
        }
    }

    pub fn put_validator(&mut self, staker: Staker) {
        let diff = self.entry(staker.subnet_id, staker.node_id);
        let replaced = diff.added.replace(staker.clone());
        if let Some(old) = replaced {
            self.added_stakers.remove(&old);
        }
        self.added_stakers.insert(staker);
    }

    /// Deleting a validator added in this same diff only drops the
    /// addition; an earlier deletion of the parent's validator stays.
    pub fn delete_validator(&mut self, staker: &Staker) {
        let diff = self.entry(staker.subnet_id, staker.node_id);
        if let Some(added) = diff.added.take() {
            self.added_stakers.remove(&added);
            return;
        }
        diff.deleted = Some(staker.clone());
        self.deleted_stakers.insert(staker.tx_id, staker.clone());
    }

    /// Parent delegators with this diff's changes, in staker order.
    pub fn get_delegators(
        &self,
        subnet_id: SubnetId,
        node_id: NodeId,
        parent: Vec<Staker>,
    ) -> Vec<Staker> {
        let Some(diff) = self
            .validator_diffs
            .get(&subnet_id)
            .and_then(|nodes| nodes.get(&node_id))
        else {
            return parent;
        };
        let mut merged: BTreeSet<Staker> = parent
            .into_iter()
            .filter(|s| !diff.deleted_delegators.contains_key(&s.tx_id))
            .collect();
        merged.extend(diff.added_delegators.iter().cloned());
        merged.into_iter().collect()
    }

    pub fn put_delegator(&mut self, staker: Staker) {
        let diff = self.entry(staker.subnet_id, staker.node_id);
        diff.added_delegators.insert(staker.clone());
        self.added_stakers.insert(staker);
    }

    pub fn delete_delegator(&mut self, staker: &Staker) {
        let diff = self.entry(staker.subnet_id, staker.node_id);
        if diff.added_delegators.remove(staker) {
            self.added_stakers.remove(staker);
            return;
        }
        diff.deleted_delegators.insert(staker.tx_id, staker.clone());
        self.deleted_stakers.insert(staker.tx_id, staker.clone());
    }

    /// Parent stakers with this diff's changes, in staker order.
    pub fn stakers(&self, parent: Vec<Staker>) -> Vec<Staker> {
        let mut merged: BTreeSet<Staker> = parent
            .into_iter()
            .filter(|s| !self.deleted_stakers.contains_key(&s.tx_id))
            .collect();
        merged.extend(self.added_stakers.iter().cloned());
        merged.into_iter().collect()
    }

    /// Every modified entry in `(subnet, node)` order.
    pub fn validator_diffs(&self) -> impl Iterator<Item = (&SubnetId, &NodeId, &DiffValidator)> {
        self.validator_diffs
            .iter()
            .flat_map(|(subnet, nodes)| nodes.iter().map(move |(node, d)| (subnet, node, d)))
    }

    pub fn is_empty(&self) -> bool {
        self.added_stakers.is_empty() && self.deleted_stakers.is_empty()
    }
}
