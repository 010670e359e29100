pub mod blocks;
pub mod matrix;
pub mod phylo;
pub mod pinch;
pub mod refine;
