extern crate clap;
use clap::*;

mod cmd_ppr;

fn main() -> anyhow::Result<()> {
    let app = Command::new("ppr")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`ppr` - Pinch Paralogy Refiner")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_ppr::refine::make_subcommand())
        .subcommand(cmd_ppr::nj::make_subcommand())
        .subcommand(cmd_ppr::partition::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Graph refinement:
    * refine - Split blocks whose trees reveal ancient duplications

* Building bricks:
    * nj        - Neighbor-Joining tree from a distance matrix
    * partition - Outgroup split of a distance matrix's taxa

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("refine", sub_matches)) => cmd_ppr::refine::execute(sub_matches),
        Some(("nj", sub_matches)) => cmd_ppr::nj::execute(sub_matches),
        Some(("partition", sub_matches)) => cmd_ppr::partition::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
