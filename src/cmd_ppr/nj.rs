use clap::*;
use ppr::libs::matrix::DistMatrix;
use ppr::libs::phylo::nj::nj;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("nj")
        .about("Construct a phylogenetic tree using Neighbor-Joining")
        .after_help(
            r###"
Constructs a tree from a distance matrix using the Neighbor-Joining (NJ)
algorithm.

Notes:
* Input: PHYLIP distance matrix (relaxed or strict).
* Output: Newick tree, unrooted (anchored at the last join).
* Ties break on the first minimum, so the output is reproducible.

Examples:
1. Build tree from matrix:
   ppr nj matrix.phy -o tree.nwk

2. Pipe matrix to tree:
   cat matrix.phy | ppr nj stdin > tree.nwk

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input PHYLIP matrix file. [stdin] for standard input"),
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
    let infile = args.get_one::<String>("infile").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    // Load matrix
    let named = intspan::NamedMatrix::from_relaxed_phylip(infile);
    let (matrix, names) = to_dist(&named);

    // Build tree
    let tree = nj(&matrix, &names)?;

    // Output tree
    let mut writer = intspan::writer(outfile);
    writer.write_all((tree.to_newick() + "\n").as_ref())?;

    Ok(())
}

pub(crate) fn to_dist(named: &intspan::NamedMatrix) -> (DistMatrix, Vec<String>) {
    let names = named.get_names();
    let n = names.len();
    let mut matrix = DistMatrix::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            matrix.set(i, j, named.get(i, j) as f64);
        }
    }
    (matrix, names.iter().map(|name| name.to_string()).collect())
}
