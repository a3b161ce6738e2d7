use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{Id, NodeId, SubnetId};

/// Net change of a validator's weight at one height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorWeightDiff {
    pub decrease: bool,
    pub amount: u64,
}

impl ValidatorWeightDiff {
    pub fn new(decrease: bool, amount: u64) -> Self {
        Self { decrease, amount }
    }

    /// Folds another change into this one. Magnitude overflow is an error.
    pub fn add(&mut self, decrease: bool, amount: u64) -> Result<(), LedgerError> {
        if self.decrease == decrease {
            self.amount = self
                .amount
                .checked_add(amount)
                .ok_or(LedgerError::WeightOverflow)?;
        } else if self.amount > amount {
            self.amount -= amount;
        } else {
            self.amount = amount - self.amount;
            self.decrease = decrease;
        }
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Weight after this change.
    pub fn apply(&self, weight: u64) -> Option<u64> {
        if self.decrease {
            weight.checked_sub(self.amount)
        } else {
            weight.checked_add(self.amount)
        }
    }

    /// Weight before this change.
    pub fn undo(&self, weight: u64) -> Option<u64> {
        if self.decrease {
            weight.checked_add(self.amount)
        } else {
            weight.checked_sub(self.amount)
        }
    }
}

const SUBNET_LEN: usize = 32;
const HEIGHT_LEN: usize = 8;
const NODE_LEN: usize = 20;

/// `subnet || height (big endian) || node`
pub fn weight_diff_key(subnet_id: SubnetId, height: u64, node_id: NodeId) -> Vec<u8> {
    let mut key = weight_diff_prefix(subnet_id, height);
    key.extend_from_slice(&node_id.0);
    key
}

/// Prefix of every diff recorded for `subnet_id` at `height`.
pub fn weight_diff_prefix(subnet_id: SubnetId, height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(SUBNET_LEN + HEIGHT_LEN + NODE_LEN);
    key.extend_from_slice(subnet_id.as_bytes());
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn parse_weight_diff_key(key: &[u8]) -> Option<(SubnetId, u64, NodeId)> {
    if key.len() != SUBNET_LEN + HEIGHT_LEN + NODE_LEN {
        return None;
    }
    let subnet: [u8; 32] = key[..SUBNET_LEN].try_into().ok()?;
    let height: [u8; 8] = key[SUBNET_LEN..SUBNET_LEN + HEIGHT_LEN].try_into().ok()?;
    let node: [u8; 20] = key[SUBNET_LEN + HEIGHT_LEN..].try_into().ok()?;
    Some((Id(subnet), u64::from_be_bytes(height), NodeId(node)))
}
