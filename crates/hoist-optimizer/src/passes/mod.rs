//! Graph transformers run by the pass manager.

mod cse;
mod upstream_gather;
mod upstream_reshape;

pub use cse::CommonSubexpressionPass;
pub use upstream_gather::UpstreamGatherPass;
pub use upstream_reshape::UpstreamReshapePass;
