use clap::*;
use itertools::Itertools;
use ppr::libs::phylo::nj::nj;
use ppr::libs::phylo::partition::{split_on_outgroups, PartitionOpt};
use std::io::{BufRead, Write};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("partition")
        .about("Split a distance matrix's taxa on outgroup clades")
        .after_help(
            r###"
Builds a Neighbor-Joining tree from the matrix, then cuts every maximal clade
that contains only outgroup taxa. Each resulting component is printed as one
tab-separated line.

Notes:
* With no outgroups, or no qualifying clade, all taxa land on a single line.
* Unknown outgroup names are rejected.

Examples:
1. Two outgroup taxa:
   ppr partition matrix.phy -g og0 -g og1

2. Outgroups from a file:
   ppr partition matrix.phy --og-file outgroups.txt

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
            Arg::new("outgroup")
                .long("outgroup")
                .short('g')
                .num_args(1)
                .action(ArgAction::Append)
                .help("Name of an outgroup taxon"),
        )
        .arg(
            Arg::new("og-file")
                .long("og-file")
                .num_args(1)
                .help("A file containing outgroup names, one per line"),
        )
        .arg(
            Arg::new("min-support")
                .long("min-support")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help("Only cut clades with at least this support value"),
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

    let mut og_names: Vec<String> = Vec::new();
    if let Some(names) = args.get_many::<String>("outgroup") {
        og_names.extend(names.cloned());
    }
    if let Some(og_file) = args.get_one::<String>("og-file") {
        for line in intspan::reader(og_file).lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                og_names.push(name.to_string());
            }
        }
    }

    let opt = PartitionOpt {
        require_outgroup: true,
        min_clade_support: args.get_one::<f64>("min-support").copied(),
    };

    //----------------------------
    // Process
    //----------------------------
    let named = intspan::NamedMatrix::from_relaxed_phylip(infile);
    let (matrix, names) = super::nj::to_dist(&named);

    let mut outgroups = Vec::new();
    for og in &og_names {
        match names.iter().position(|name| name == og) {
            Some(index) => outgroups.push(index),
            None => anyhow::bail!("outgroup {} is not a taxon of the matrix", og),
        }
    }

    let tree = nj(&matrix, &names)?;
    let groups = split_on_outgroups(&tree, &outgroups, &opt);

    //----------------------------
    // Output
    //----------------------------
    for group in groups {
        let line = group.iter().map(|&i| names[i].as_str()).join("\t");
        writer.write_fmt(format_args!("{}\n", line))?;
    }

    Ok(())
}
