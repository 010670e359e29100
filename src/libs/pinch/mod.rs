//! Handle-based pinch graph arena.
//!
//! Threads, segments and blocks are addressed by plain index handles instead
//! of pointers. Block slots are `Option` so destruction keeps every other
//! handle stable; a destroyed block's id is never reused within a pass.

pub mod feature;

use anyhow::{bail, Result};

pub type ThreadId = usize;
pub type SegId = usize;
pub type BlockId = usize;

#[derive(Debug, Clone)]
pub struct Thread {
    pub name: String,
    pub len: usize,
    /// Segments on this thread, kept sorted by start.
    pub segments: Vec<SegId>,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub thread: ThreadId,
    pub start: usize,
    pub len: usize,
    /// Owning block, if any.
    pub block: Option<BlockId>,
    /// Block-relative orientation: true = forward.
    pub orient: bool,
}

/// A maximal set of currently-merged aligned segments.
///
/// Member order is the per-pass enumeration order `0..degree-1`.
#[derive(Debug, Clone)]
pub struct Block {
    pub segments: Vec<SegId>,
    /// Common segment length; all members of a block are the same length.
    pub len: usize,
}

#[derive(Debug, Default, Clone)]
pub struct PinchGraph {
    threads: Vec<Thread>,
    segments: Vec<Segment>,
    blocks: Vec<Option<Block>>,
}

impl PinchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_thread(&mut self, name: impl Into<String>, len: usize) -> ThreadId {
        let id = self.threads.len();
        self.threads.push(Thread {
            name: name.into(),
            len,
            segments: Vec::new(),
        });
        id
    }

    pub fn thread(&self, id: ThreadId) -> &Thread {
        &self.threads[id]
    }

    pub fn thread_by_name(&self, name: &str) -> Option<ThreadId> {
        self.threads.iter().position(|t| t.name == name)
    }

    pub fn add_segment(&mut self, thread: ThreadId, start: usize, len: usize) -> Result<SegId> {
        if start + len > self.threads[thread].len {
            bail!(
                "segment {}:{}-{} exceeds thread length {}",
                self.threads[thread].name,
                start,
                start + len,
                self.threads[thread].len
            );
        }
        let id = self.segments.len();
        self.segments.push(Segment {
            thread,
            start,
            len,
            block: None,
            orient: true,
        });
        let pos = self.threads[thread]
            .segments
            .partition_point(|&s| self.segments[s].start < start);
        self.threads[thread].segments.insert(pos, id);
        Ok(id)
    }

    pub fn segment(&self, id: SegId) -> &Segment {
        &self.segments[id]
    }

    /// Construct a new block seeded from one segment with a reference
    /// orientation.
    pub fn new_block(&mut self, seed: SegId, orient: bool) -> Result<BlockId> {
        if self.segments[seed].block.is_some() {
            bail!("segment {} already belongs to a block", seed);
        }
        let id = self.blocks.len();
        self.blocks.push(Some(Block {
            segments: vec![seed],
            len: self.segments[seed].len,
        }));
        self.segments[seed].block = Some(id);
        self.segments[seed].orient = orient;
        Ok(id)
    }

    /// Extend a block by merging one more segment with the given orientation.
    pub fn pinch(&mut self, block: BlockId, seg: SegId, orient: bool) -> Result<()> {
        if self.segments[seg].block.is_some() {
            bail!("segment {} already belongs to a block", seg);
        }
        let slot = match self.blocks.get_mut(block) {
            Some(Some(slot)) => slot,
            _ => bail!("block {} does not exist", block),
        };
        if self.segments[seg].len != slot.len {
            bail!(
                "segment length {} does not match block length {}",
                self.segments[seg].len,
                slot.len
            );
        }
        slot.segments.push(seg);
        self.segments[seg].block = Some(block);
        self.segments[seg].orient = orient;
        Ok(())
    }

    /// Destroy a block, releasing its segments. The handle is dead afterwards.
    pub fn destruct_block(&mut self, block: BlockId) {
        if let Some(Some(slot)) = self.blocks.get_mut(block).map(Option::take) {
            for seg in slot.segments {
                self.segments[seg].block = None;
                self.segments[seg].orient = true;
            }
        }
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id).and_then(Option::as_ref)
    }

    pub fn degree(&self, id: BlockId) -> usize {
        self.block(id).map_or(0, |b| b.segments.len())
    }

    /// Members of a block in enumeration order.
    pub fn segments_of(&self, id: BlockId) -> &[SegId] {
        self.block(id).map_or(&[], |b| b.segments.as_slice())
    }

    /// Stable snapshot of all live block ids.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|_| i))
            .collect()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// The segment preceding / following `seg` on its own thread.
    pub fn neighbor(&self, seg: SegId, forward: bool) -> Option<SegId> {
        let segment = &self.segments[seg];
        let thread = &self.threads[segment.thread];
        let pos = thread.segments.iter().position(|&s| s == seg)?;
        if forward {
            thread.segments.get(pos + 1).copied()
        } else {
            pos.checked_sub(1).map(|p| thread.segments[p])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_thread_graph() -> (PinchGraph, Vec<SegId>) {
        let mut graph = PinchGraph::new();
        let t0 = graph.add_thread("alpha", 100);
        let t1 = graph.add_thread("beta", 100);
        let s0 = graph.add_segment(t0, 0, 10).unwrap();
        let s1 = graph.add_segment(t0, 10, 10).unwrap();
        let s2 = graph.add_segment(t1, 0, 10).unwrap();
        let s3 = graph.add_segment(t1, 10, 10).unwrap();
        (graph, vec![s0, s1, s2, s3])
    }

    #[test]
    fn test_block_lifecycle() {
        let (mut graph, segs) = two_thread_graph();
        let block = graph.new_block(segs[0], true).unwrap();
        graph.pinch(block, segs[2], false).unwrap();

        assert_eq!(graph.degree(block), 2);
        assert_eq!(graph.segments_of(block), &[segs[0], segs[2]]);
        assert!(graph.segment(segs[0]).orient);
        assert!(!graph.segment(segs[2]).orient);

        graph.destruct_block(block);
        assert!(graph.block(block).is_none());
        assert!(graph.segment(segs[0]).block.is_none());
        assert_eq!(graph.block_count(), 0);
    }

    #[test]
    fn test_double_pinch_rejected() {
        let (mut graph, segs) = two_thread_graph();
        let block = graph.new_block(segs[0], true).unwrap();
        graph.pinch(block, segs[2], true).unwrap();
        assert!(graph.pinch(block, segs[2], true).is_err());
        assert!(graph.new_block(segs[0], true).is_err());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut graph = PinchGraph::new();
        let t0 = graph.add_thread("alpha", 100);
        let s0 = graph.add_segment(t0, 0, 10).unwrap();
        let s1 = graph.add_segment(t0, 10, 20).unwrap();
        let block = graph.new_block(s0, true).unwrap();
        assert!(graph.pinch(block, s1, true).is_err());
    }

    #[test]
    fn test_neighbor() {
        let (graph, segs) = two_thread_graph();
        assert_eq!(graph.neighbor(segs[0], true), Some(segs[1]));
        assert_eq!(graph.neighbor(segs[0], false), None);
        assert_eq!(graph.neighbor(segs[1], false), Some(segs[0]));
        assert_eq!(graph.neighbor(segs[3], true), None);
    }

    #[test]
    fn test_segment_bounds_checked() {
        let mut graph = PinchGraph::new();
        let t0 = graph.add_thread("alpha", 5);
        assert!(graph.add_segment(t0, 0, 10).is_err());
    }
}
