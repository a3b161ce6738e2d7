pub mod staker;
pub mod stakers;
pub mod weight_diff;

pub use staker::Staker;
pub use stakers::{BaseStakers, DiffLookup, DiffStakers, DiffValidator};
pub use weight_diff::{
    parse_weight_diff_key, weight_diff_key, weight_diff_prefix, ValidatorWeightDiff,
};
