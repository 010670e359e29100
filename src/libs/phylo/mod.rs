pub mod nj;
pub mod node;
pub mod partition;
pub mod tree;

pub use node::{Node, NodeId};
pub use partition::PartitionOpt;
pub use tree::Tree;
