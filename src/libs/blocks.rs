//! Plain-text block tables.
//!
//! One block per line; members are whitespace-separated
//! `thread:start:length:strand` fields, `0`-based starts, strand `+`/`-`.
//! Lines starting with `#` are comments.

use crate::libs::pinch::PinchGraph;
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Parse a block table into a pinch graph. Thread lengths come from the
/// supplied sequences.
pub fn read_block_table(infile: &str, seqs: &HashMap<String, Vec<u8>>) -> Result<PinchGraph> {
    let mut graph = PinchGraph::new();
    let reader = intspan::reader(infile);

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut block = None;
        for field in line.split_whitespace() {
            let (name, start, len, orient) = parse_member(field)
                .with_context(|| format!("line {}: bad member {:?}", lineno + 1, field))?;

            let thread = match graph.thread_by_name(&name) {
                Some(thread) => thread,
                None => {
                    let seq = seqs
                        .get(&name)
                        .with_context(|| format!("line {}: no sequence for thread {}", lineno + 1, name))?;
                    graph.add_thread(name.clone(), seq.len())
                }
            };
            let seg = graph.add_segment(thread, start, len)?;
            match block {
                None => block = Some(graph.new_block(seg, orient)?),
                Some(id) => graph.pinch(id, seg, orient)?,
            }
        }
        if block.is_none() {
            bail!("line {}: block with no members", lineno + 1);
        }
    }

    Ok(graph)
}

fn parse_member(field: &str) -> Result<(String, usize, usize, bool)> {
    let parts: Vec<&str> = field.split(':').collect();
    if parts.len() != 4 {
        bail!("expected thread:start:length:strand");
    }
    let start: usize = parts[1].parse()?;
    let len: usize = parts[2].parse()?;
    if len == 0 {
        bail!("zero-length segment");
    }
    let orient = match parts[3] {
        "+" => true,
        "-" => false,
        other => bail!("strand must be + or -, got {:?}", other),
    };
    Ok((parts[0].to_string(), start, len, orient))
}

/// Write every live block, one line per block, members in enumeration order.
pub fn write_block_table(graph: &PinchGraph, writer: &mut dyn Write) -> Result<()> {
    for block in graph.block_ids() {
        let line = graph
            .segments_of(block)
            .iter()
            .map(|&seg| {
                let segment = graph.segment(seg);
                format!(
                    "{}:{}:{}:{}",
                    graph.thread(segment.thread).name,
                    segment.start,
                    segment.len,
                    if segment.orient { '+' } else { '-' }
                )
            })
            .join("\t");
        writer.write_fmt(format_args!("{}\n", line))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn seq_map(pairs: &[(&str, &str)]) -> HashMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(name, seq)| (name.to_string(), seq.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let seqs = seq_map(&[("alpha", "ACGTACGT"), ("beta", "ACGTACGT")]);
        let table = "# comment\nalpha:0:4:+\tbeta:0:4:-\nalpha:4:4:+\n";

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(table.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let graph = read_block_table(&path, &seqs).unwrap();
        assert_eq!(graph.block_count(), 2);

        let mut out = Vec::new();
        write_block_table(&graph, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "alpha:0:4:+\tbeta:0:4:-\nalpha:4:4:+\n");
    }

    #[test]
    fn test_bad_member() {
        let seqs = seq_map(&[("alpha", "ACGT")]);
        for table in ["alpha:0:4\n", "alpha:0:4:x\n", "alpha:0:0:+\n"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(table.as_bytes()).unwrap();
            let path = file.path().to_str().unwrap().to_string();
            assert!(read_block_table(&path, &seqs).is_err());
        }
    }

    #[test]
    fn test_unknown_thread() {
        let seqs = seq_map(&[("alpha", "ACGT")]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"gamma:0:4:+\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert!(read_block_table(&path, &seqs).is_err());
    }
}
