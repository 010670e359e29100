//! Contextual evidence extraction for one block.
//!
//! Substitution evidence comes from the block's own aligned columns plus
//! flanking bases on each member's thread; breakpoint evidence from the
//! nearest aligned neighbors along each thread. Both feed a `ScoreMatrix`
//! indexed by the block's segment enumeration.

use super::{BlockId, PinchGraph, SegId};
use crate::libs::matrix::ScoreMatrix;
use std::collections::HashMap;
use std::fmt;

/// Evidence derivation failed for one block; the orchestrator leaves that
/// block unsplit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// No sequence string supplied for a thread
    MissingSequence(String),
    /// A segment span lies outside the supplied sequence
    OutOfBounds {
        thread: String,
        end: usize,
        len: usize,
    },
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::MissingSequence(name) => {
                write!(f, "no sequence supplied for thread {}", name)
            }
            FeatureError::OutOfBounds { thread, end, len } => {
                write!(
                    f,
                    "segment on thread {} ends at {} but the sequence has {} bases",
                    thread, end, len
                )
            }
        }
    }
}

impl std::error::Error for FeatureError {}

/// Window parameters for contextual feature extraction.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    /// Flank length in bases on each side of a segment
    pub max_base_distance: usize,
    /// How many neighboring blocks the flank walk may cross
    pub max_block_distance: usize,
    /// Skip flank positions that no block covers
    pub ignore_unaligned: bool,
    /// Keep only columns where every member contributes a base
    pub only_complete: bool,
}

impl Default for FeatureWindow {
    fn default() -> Self {
        Self {
            max_base_distance: 1000,
            max_block_distance: 100,
            ignore_unaligned: true,
            only_complete: false,
        }
    }
}

fn complement(base: u8) -> Option<u8> {
    match base.to_ascii_uppercase() {
        b'A' => Some(b'T'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        b'T' => Some(b'A'),
        _ => None,
    }
}

fn plain(base: u8) -> Option<u8> {
    match base.to_ascii_uppercase() {
        b @ (b'A' | b'C' | b'G' | b'T') => Some(b),
        _ => None,
    }
}

/// Resolve the per-thread sequence slices, checking every member's span.
fn thread_seqs<'a>(
    graph: &PinchGraph,
    block: BlockId,
    seqs: &'a HashMap<String, Vec<u8>>,
) -> Result<HashMap<usize, &'a [u8]>, FeatureError> {
    let mut out: HashMap<usize, &[u8]> = HashMap::new();
    for &seg_id in graph.segments_of(block) {
        let segment = graph.segment(seg_id);
        let thread = graph.thread(segment.thread);
        let seq = seqs
            .get(&thread.name)
            .ok_or_else(|| FeatureError::MissingSequence(thread.name.clone()))?;
        let end = segment.start + segment.len;
        if end > seq.len() {
            return Err(FeatureError::OutOfBounds {
                thread: thread.name.clone(),
                end,
                len: seq.len(),
            });
        }
        out.insert(segment.thread, seq.as_slice());
    }
    Ok(out)
}

/// Base of `seg` at block-relative column `offset`, reverse-complemented for
/// reverse-oriented members. Non-ACGT characters yield None.
fn column_base(graph: &PinchGraph, seqs: &HashMap<usize, &[u8]>, seg_id: SegId, offset: usize) -> Option<u8> {
    let segment = graph.segment(seg_id);
    let seq = seqs.get(&segment.thread)?;
    if segment.orient {
        plain(seq[segment.start + offset])
    } else {
        complement(seq[segment.start + segment.len - 1 - offset])
    }
}

/// Flank bases of one member on one side, in block-relative reading order.
/// The walk stops at the thread end, after `max_base_distance` bases, or once
/// more than `max_block_distance` aligned neighbors have been crossed.
fn flank(
    graph: &PinchGraph,
    seqs: &HashMap<usize, &[u8]>,
    seg_id: SegId,
    right: bool,
    window: &FeatureWindow,
) -> Vec<Option<u8>> {
    let segment = graph.segment(seg_id);
    let seq = match seqs.get(&segment.thread) {
        Some(seq) => *seq,
        None => return Vec::new(),
    };
    let thread_len = graph.thread(segment.thread).len.min(seq.len());

    // Block-relative right maps to increasing thread coordinates for forward
    // members and decreasing ones for reverse members.
    let ascending = segment.orient == right;

    let mut out = Vec::new();
    let mut crossed = 0usize;
    let mut last_seen: Option<SegId> = None;
    for step in 1..=window.max_base_distance {
        let pos = if ascending {
            let pos = segment.start + segment.len - 1 + step;
            if pos >= thread_len {
                break;
            }
            pos
        } else {
            match segment.start.checked_sub(step) {
                Some(pos) => pos,
                None => break,
            }
        };

        let cover = covering_segment(graph, segment.thread, pos);
        if let Some(cover_id) = cover {
            if last_seen != Some(cover_id) {
                if graph.segment(cover_id).block.is_some() {
                    crossed += 1;
                    if crossed > window.max_block_distance {
                        break;
                    }
                }
                last_seen = Some(cover_id);
            }
        }

        let aligned = cover.is_some_and(|c| graph.segment(c).block.is_some());
        if window.ignore_unaligned && !aligned {
            out.push(None);
            continue;
        }

        out.push(if segment.orient {
            plain(seq[pos])
        } else {
            complement(seq[pos])
        });
    }
    out
}

fn covering_segment(graph: &PinchGraph, thread: usize, pos: usize) -> Option<SegId> {
    graph
        .thread(thread)
        .segments
        .iter()
        .copied()
        .find(|&s| {
            let segment = graph.segment(s);
            pos >= segment.start && pos < segment.start + segment.len
        })
}

/// Substitution evidence over the block's aligned columns and flanks.
pub fn substitution_matrix(
    graph: &PinchGraph,
    block: BlockId,
    seqs: &HashMap<String, Vec<u8>>,
    window: &FeatureWindow,
) -> Result<ScoreMatrix, FeatureError> {
    let members = graph.segments_of(block).to_vec();
    let degree = members.len();
    let by_thread = thread_seqs(graph, block, seqs)?;
    let mut matrix = ScoreMatrix::new(degree);

    let block_len = graph.block(block).map_or(0, |b| b.len);

    // Core columns
    for offset in 0..block_len {
        let column: Vec<Option<u8>> = members
            .iter()
            .map(|&seg| column_base(graph, &by_thread, seg, offset))
            .collect();
        score_column(&mut matrix, &column, window.only_complete);
    }

    // Flank columns on both sides
    for right in [false, true] {
        let flanks: Vec<Vec<Option<u8>>> = members
            .iter()
            .map(|&seg| flank(graph, &by_thread, seg, right, window))
            .collect();
        let width = flanks.iter().map(Vec::len).max().unwrap_or(0);
        for step in 0..width {
            let column: Vec<Option<u8>> = flanks
                .iter()
                .map(|f| f.get(step).copied().flatten())
                .collect();
            score_column(&mut matrix, &column, window.only_complete);
        }
    }

    Ok(matrix)
}

fn score_column(matrix: &mut ScoreMatrix, column: &[Option<u8>], only_complete: bool) {
    if only_complete && column.iter().any(Option::is_none) {
        return;
    }
    for i in 0..column.len() {
        for j in (i + 1)..column.len() {
            if let (Some(a), Some(b)) = (column[i], column[j]) {
                if a == b {
                    matrix.record_similarity(i, j);
                } else {
                    matrix.record_difference(i, j);
                }
            }
        }
    }
}

/// Nearest block on one side of `seg` along its thread, within the window.
fn adjacent_block(
    graph: &PinchGraph,
    seg_id: SegId,
    right: bool,
    window: &FeatureWindow,
) -> Option<BlockId> {
    let orient = graph.segment(seg_id).orient;
    let forward = orient == right;
    let mut current = seg_id;
    for _ in 0..=window.max_block_distance {
        current = graph.neighbor(current, forward)?;
        if let Some(block) = graph.segment(current).block {
            return Some(block);
        }
        if !window.ignore_unaligned {
            // An unaligned gap counts as a real adjacency break.
            return None;
        }
    }
    None
}

/// Breakpoint evidence: do two members see the same aligned neighbor on each
/// side? Pairs where either member has no neighbor contribute nothing.
pub fn breakpoint_matrix(graph: &PinchGraph, block: BlockId, window: &FeatureWindow) -> ScoreMatrix {
    let members = graph.segments_of(block).to_vec();
    let degree = members.len();
    let mut matrix = ScoreMatrix::new(degree);

    for right in [false, true] {
        let neighbors: Vec<Option<BlockId>> = members
            .iter()
            .map(|&seg| adjacent_block(graph, seg, right, window))
            .collect();
        for i in 0..degree {
            for j in (i + 1)..degree {
                if let (Some(a), Some(b)) = (neighbors[i], neighbors[j]) {
                    if a == b {
                        matrix.record_similarity(i, j);
                    } else {
                        matrix.record_difference(i, j);
                    }
                }
            }
        }
    }
    matrix
}
