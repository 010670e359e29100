use clap::*;
use ppr::libs::blocks::{read_block_table, write_block_table};
use ppr::libs::phylo::PartitionOpt;
use ppr::libs::pinch::feature::FeatureWindow;
use ppr::libs::refine::{remove_ancient_homologies, RefineOpt};
use std::collections::{HashMap, HashSet};
use std::io::BufRead;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("refine")
        .about("Remove ancient homologies from a block table")
        .after_help(
            r###"
For every block, pairwise evidence is gathered from the sequences, a
neighbor-joining tree is built, and the block is split wherever the tree
isolates a clade of outgroup segments. Blocks without outgroup members pass
through unchanged.

Notes:
* <blocks.tsv> holds one block per line; members are `thread:start:length:strand`.
* Thread names must match the FASTA record names.
* Breakpoint evidence is computed but weighted 0 by default; raise
  `--bp-weight` to include it.

Examples:
1. Split with two outgroup threads:
   ppr refine tests/refine/blocks.tsv tests/refine/seqs.fa -g og0 -g og1

2. Outgroups from a file, narrow context window:
   ppr refine blocks.tsv seqs.fa --og-file outgroups.txt --max-base-dist 100

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input block table. [stdin] for standard input"),
        )
        .arg(
            Arg::new("fasta")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Thread sequences in FASTA format"),
        )
        .arg(
            Arg::new("outgroup")
                .long("outgroup")
                .short('g')
                .num_args(1)
                .action(ArgAction::Append)
                .help("Name of an outgroup thread"),
        )
        .arg(
            Arg::new("og-file")
                .long("og-file")
                .num_args(1)
                .help("A file containing outgroup thread names, one per line"),
        )
        .arg(
            Arg::new("max-base-dist")
                .long("max-base-dist")
                .num_args(1)
                .default_value("1000")
                .value_parser(value_parser!(usize))
                .help("Flank length in bases on each side of a segment"),
        )
        .arg(
            Arg::new("max-block-dist")
                .long("max-block-dist")
                .num_args(1)
                .default_value("100")
                .value_parser(value_parser!(usize))
                .help("How many neighboring blocks the context walk may cross"),
        )
        .arg(
            Arg::new("include-unaligned")
                .long("include-unaligned")
                .action(ArgAction::SetTrue)
                .help("Use flank bases that no block covers"),
        )
        .arg(
            Arg::new("complete-columns")
                .long("complete-columns")
                .action(ArgAction::SetTrue)
                .help("Keep only feature columns where every member has a base"),
        )
        .arg(
            Arg::new("sub-weight")
                .long("sub-weight")
                .num_args(1)
                .default_value("1.0")
                .value_parser(value_parser!(f64))
                .help("Weight of substitution evidence"),
        )
        .arg(
            Arg::new("bp-weight")
                .long("bp-weight")
                .num_args(1)
                .default_value("0.0")
                .value_parser(value_parser!(f64))
                .help("Weight of breakpoint evidence"),
        )
        .arg(
            Arg::new("min-support")
                .long("min-support")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help("Only cut clades with at least this support value"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .action(ArgAction::SetTrue)
                .help("Analyze blocks in parallel"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    let infile = args.get_one::<String>("infile").unwrap();
    let fasta = args.get_one::<String>("fasta").unwrap();

    let mut outgroups: HashSet<String> = HashSet::new();
    if let Some(names) = args.get_many::<String>("outgroup") {
        outgroups.extend(names.cloned());
    }
    if let Some(og_file) = args.get_one::<String>("og-file") {
        for line in intspan::reader(og_file).lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                outgroups.insert(name.to_string());
            }
        }
    }

    let opt = RefineOpt {
        window: FeatureWindow {
            max_base_distance: *args.get_one::<usize>("max-base-dist").unwrap(),
            max_block_distance: *args.get_one::<usize>("max-block-dist").unwrap(),
            ignore_unaligned: !args.get_flag("include-unaligned"),
            only_complete: args.get_flag("complete-columns"),
        },
        sub_weight: *args.get_one::<f64>("sub-weight").unwrap(),
        bp_weight: *args.get_one::<f64>("bp-weight").unwrap(),
        partition: PartitionOpt {
            require_outgroup: true,
            min_clade_support: args.get_one::<f64>("min-support").copied(),
        },
        parallel: args.get_flag("parallel"),
    };

    //----------------------------
    // Load
    //----------------------------
    let mut seqs: HashMap<String, Vec<u8>> = HashMap::new();
    let reader = intspan::reader(fasta);
    let mut fa_in = noodles_fasta::io::Reader::new(reader);
    for result in fa_in.records() {
        let record = result?;
        let name = String::from_utf8(record.name().into())?;
        seqs.insert(name, record.sequence().as_ref().to_vec());
    }

    let mut graph = read_block_table(infile, &seqs)?;

    //----------------------------
    // Process
    //----------------------------
    remove_ancient_homologies(&mut graph, &seqs, &outgroups, &opt)?;

    //----------------------------
    // Output
    //----------------------------
    write_block_table(&graph, &mut writer)?;

    Ok(())
}
