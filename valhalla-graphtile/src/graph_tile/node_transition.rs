use zerocopy::U64;
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, Unaligned};

/// A single row of the node-transitions table.
///
/// This core doesn't consult transitions (they exist in the on-disk
/// format to let a node on this level refer to the "same" intersection on
/// a coarser hierarchy level, and only level 2 is ever used here), but the
/// table still has to be skipped over correctly: the directed-edge table
/// begins immediately after it, so its declared row count and fixed
/// 8-byte row size are load-bearing for offset arithmetic even though no
/// row is ever decoded.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, Unaligned, Debug)]
#[repr(C)]
pub struct NodeTransition(U64<zerocopy::LE>);
