mod comb;
pub use comb::LogicPath;
pub use comb::SLTNode;
pub use comb::{NodeId, SLTNodeArena};
