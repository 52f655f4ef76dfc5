mod multi_mask;
mod pairwise;
mod presence;

pub use multi_mask::{ChannelWeighting, MultiMaskReducer};
pub use pairwise::PairwiseDice;
pub use presence::{any_present, weight_and_reduce};
