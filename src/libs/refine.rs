//! Two-phase removal of ancient homologies.
//!
//! Phase 1 walks every block and computes a partition of its segments from
//! substitution + breakpoint evidence, a neighbor-joining tree, and the
//! outgroup threads. Phase 2 replays the recorded partitions as structural
//! edits. The graph is never mutated while being iterated.

use crate::libs::matrix::ScoreMatrix;
use crate::libs::phylo::nj::nj;
use crate::libs::phylo::partition::{split_on_outgroups, PartitionOpt};
use crate::libs::pinch::feature::{breakpoint_matrix, substitution_matrix, FeatureWindow};
use crate::libs::pinch::{BlockId, PinchGraph, SegId};
use anyhow::{anyhow, bail, Result};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Disjoint groups of segment enumeration indices covering `0..degree-1`.
pub type Partition = Vec<Vec<usize>>;

#[derive(Debug, Clone)]
pub struct RefineOpt {
    pub window: FeatureWindow,
    /// Weight of substitution evidence in the combined matrix
    pub sub_weight: f64,
    /// Weight of breakpoint evidence. Zero by default: the evidence is
    /// computed but excluded, a deliberate, adjustable policy.
    pub bp_weight: f64,
    pub partition: PartitionOpt,
    /// Run Phase 1 across blocks on the rayon pool
    pub parallel: bool,
}

impl Default for RefineOpt {
    fn default() -> Self {
        Self {
            window: FeatureWindow::default(),
            sub_weight: 1.0,
            bp_weight: 0.0,
            partition: PartitionOpt::default(),
            parallel: false,
        }
    }
}

/// Enumeration indices of the block members that lie on outgroup threads.
pub fn outgroup_segments(
    graph: &PinchGraph,
    block: BlockId,
    outgroups: &HashSet<String>,
) -> Vec<usize> {
    graph
        .segments_of(block)
        .iter()
        .enumerate()
        .filter(|(_, &seg)| {
            let thread = graph.segment(seg).thread;
            outgroups.contains(&graph.thread(thread).name)
        })
        .map(|(i, _)| i)
        .collect()
}

fn trivial_partition(degree: usize) -> Partition {
    vec![(0..degree).collect()]
}

/// Compute the partition for one block (steps 4.1-4.4: evidence, distances,
/// tree, outgroup split). An evidence-derivation failure leaves the block
/// unsplit and warns on stderr; everything else propagates.
pub fn analyze_block(
    graph: &PinchGraph,
    block: BlockId,
    seqs: &HashMap<String, Vec<u8>>,
    outgroups: &HashSet<String>,
    opt: &RefineOpt,
) -> Result<Partition> {
    let degree = graph.degree(block);
    if degree <= 1 {
        return Ok(trivial_partition(degree));
    }

    let sub = match substitution_matrix(graph, block, seqs, &opt.window) {
        Ok(matrix) => matrix,
        Err(e) => {
            eprintln!("Warning: block {} left unsplit: {}", block, e);
            return Ok(trivial_partition(degree));
        }
    };
    let bp = breakpoint_matrix(graph, block, &opt.window);
    let combined = ScoreMatrix::combine(&sub, &bp, opt.sub_weight, opt.bp_weight);
    let dist = combined.to_distance();

    let names: Vec<String> = graph
        .segments_of(block)
        .iter()
        .map(|&seg| {
            let segment = graph.segment(seg);
            let thread = graph.thread(segment.thread);
            format!("{}:{}", thread.name, segment.start)
        })
        .collect();
    let tree = nj(&dist, &names)?;

    let og = outgroup_segments(graph, block, outgroups);
    Ok(split_on_outgroups(&tree, &og, &opt.partition))
}

/// Destroy `block` and build one replacement block per partition group,
/// preserving every member's recorded orientation.
///
/// The partition is validated as a disjoint cover *before* anything is
/// destroyed; a malformed partition aborts with the graph untouched.
pub fn split_block(graph: &mut PinchGraph, block: BlockId, partition: &Partition) -> Result<()> {
    let members: Vec<SegId> = graph.segments_of(block).to_vec();
    let degree = members.len();
    if graph.block(block).is_none() {
        bail!("block {} scheduled for splitting does not exist", block);
    }

    let mut seen = vec![false; degree];
    let mut covered = 0usize;
    for group in partition {
        if group.is_empty() {
            bail!("empty partition group for block {}", block);
        }
        for &i in group {
            if i >= degree {
                bail!(
                    "partition index {} out of range for block {} of degree {}",
                    i,
                    block,
                    degree
                );
            }
            if seen[i] {
                bail!("partition index {} duplicated for block {}", i, block);
            }
            seen[i] = true;
            covered += 1;
        }
    }
    if covered != degree {
        bail!(
            "partition covers {} of {} segments of block {}",
            covered,
            degree,
            block
        );
    }

    // Snapshot members and orientations, then destroy the old block.
    let orientations: Vec<bool> = members.iter().map(|&s| graph.segment(s).orient).collect();
    let mut remaining: Vec<Option<SegId>> = members.into_iter().map(Some).collect();
    graph.destruct_block(block);

    for group in partition {
        let k = group[0];
        let seed = remaining[k]
            .take()
            .ok_or_else(|| anyhow!("segment {} consumed twice splitting block {}", k, block))?;
        let new_block = graph.new_block(seed, orientations[k])?;
        // Each group pinches its own remaining members.
        for &j in &group[1..] {
            let seg = remaining[j]
                .take()
                .ok_or_else(|| anyhow!("segment {} consumed twice splitting block {}", j, block))?;
            graph.pinch(new_block, seg, orientations[j])?;
        }
    }

    if remaining.iter().any(Option::is_some) {
        bail!("segments left unassigned after splitting block {}", block);
    }
    Ok(())
}

/// Remove ancient homologies from the whole graph.
///
/// `seqs` maps thread names to their sequences; `outgroups` names the
/// threads designated as outgroups.
pub fn remove_ancient_homologies(
    graph: &mut PinchGraph,
    seqs: &HashMap<String, Vec<u8>>,
    outgroups: &HashSet<String>,
    opt: &RefineOpt,
) -> Result<()> {
    let block_ids = graph.block_ids();

    // Phase 1: analysis, read-only
    let shared: &PinchGraph = graph;
    let analyzed: Vec<(BlockId, Partition)> = if opt.parallel {
        block_ids
            .par_iter()
            .map(|&block| analyze_block(shared, block, seqs, outgroups, opt).map(|p| (block, p)))
            .collect::<Result<_>>()?
    } else {
        block_ids
            .iter()
            .map(|&block| analyze_block(shared, block, seqs, outgroups, opt).map(|p| (block, p)))
            .collect::<Result<_>>()?
    };

    let mut partitions: IndexMap<BlockId, Partition> = IndexMap::new();
    for (block, partition) in analyzed {
        if partitions.insert(block, partition).is_some() {
            bail!("block {} analyzed twice", block);
        }
    }

    // Phase 2: mutation, sequential
    for (block, partition) in &partitions {
        split_block(graph, *block, partition)?;
    }
    Ok(())
}
