//! One-to-one correspondence between the nodes of two trees.

use crate::tree::NodeId;

/// Bidirectional node mapping between a source tree (A) and a destination
/// tree (B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    src_to_dst: Vec<Option<NodeId>>,
    dst_to_src: Vec<Option<NodeId>>,
    len: usize,
}

impl Mapping {
    /// Empty mapping sized for the two arenas.
    #[must_use]
    pub fn new(src_len: usize, dst_len: usize) -> Self {
        Self {
            src_to_dst: vec![None; src_len],
            dst_to_src: vec![None; dst_len],
            len: 0,
        }
    }

    /// Record `src ↔ dst`. Both nodes must be unmapped.
    pub fn link(&mut self, src: NodeId, dst: NodeId) {
        debug_assert!(self.src_to_dst[src.index()].is_none());
        debug_assert!(self.dst_to_src[dst.index()].is_none());
        self.src_to_dst[src.index()] = Some(dst);
        self.dst_to_src[dst.index()] = Some(src);
        self.len += 1;
    }

    /// Partner of a source node.
    #[must_use]
    pub fn dst_of(&self, src: NodeId) -> Option<NodeId> {
        self.src_to_dst.get(src.index()).copied().flatten()
    }

    /// Partner of a destination node.
    #[must_use]
    pub fn src_of(&self, dst: NodeId) -> Option<NodeId> {
        self.dst_to_src.get(dst.index()).copied().flatten()
    }

    /// Whether the source node has a partner.
    #[must_use]
    pub fn is_src_mapped(&self, src: NodeId) -> bool {
        self.dst_of(src).is_some()
    }

    /// Whether the destination node has a partner.
    #[must_use]
    pub fn is_dst_mapped(&self, dst: NodeId) -> bool {
        self.src_of(dst).is_some()
    }

    /// Whether both nodes are still free.
    #[must_use]
    pub fn both_unmapped(&self, src: NodeId, dst: NodeId) -> bool {
        !self.is_src_mapped(src) && !self.is_dst_mapped(dst)
    }

    /// Whether `src ↔ dst` is recorded.
    #[must_use]
    pub fn has(&self, src: NodeId, dst: NodeId) -> bool {
        self.dst_of(src) == Some(dst)
    }

    /// Number of mapped pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no pair is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The same pairs with source and destination swapped.
    #[must_use]
    pub fn transposed(self) -> Self {
        Self {
            src_to_dst: self.dst_to_src,
            dst_to_src: self.src_to_dst,
            len: self.len,
        }
    }

    /// Mapped pairs in source arena order.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.src_to_dst
            .iter()
            .enumerate()
            .filter_map(|(i, dst)| dst.map(|d| (NodeId::from_index(i), d)))
    }

    /// Arena length of the source side.
    #[must_use]
    pub(crate) fn src_len(&self) -> usize {
        self.src_to_dst.len()
    }

    /// Arena length of the destination side.
    #[must_use]
    pub(crate) fn dst_len(&self) -> usize {
        self.dst_to_src.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transposed_swaps_sides() {
        let (a, b) = (NodeId::from_index(0), NodeId::from_index(2));
        let mut mapping = Mapping::new(1, 3);
        mapping.link(a, b);

        let flipped = mapping.transposed();
        assert_eq!(flipped.src_len(), 3);
        assert_eq!(flipped.dst_len(), 1);
        assert!(flipped.has(b, a));
        assert_eq!(flipped.len(), 1);
    }
}
