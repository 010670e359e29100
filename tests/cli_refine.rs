use assert_cmd::Command;

#[test]
fn command_refine_splits_paralogs() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("ppr")?;
    let output = cmd
        .arg("refine")
        .arg("tests/refine/blocks.tsv")
        .arg("tests/refine/seqs.fa")
        .arg("-g")
        .arg("og0")
        .arg("-g")
        .arg("og1")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    // The degree-4 block splits into ingroup and outgroup pairs; the
    // outgroup-free block passes through whole.
    assert_eq!(
        stdout,
        "in0:0:8:+\tin1:0:8:+\nog0:0:8:+\tog1:0:8:+\nin0:8:8:+\tin1:8:8:+\n"
    );

    Ok(())
}

#[test]
fn command_refine_og_file() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("ppr")?;
    let output = cmd
        .arg("refine")
        .arg("tests/refine/blocks.tsv")
        .arg("tests/refine/seqs.fa")
        .arg("--og-file")
        .arg("tests/refine/outgroups.txt")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 3);

    Ok(())
}

#[test]
fn command_refine_no_outgroups() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("ppr")?;
    let output = cmd
        .arg("refine")
        .arg("tests/refine/blocks.tsv")
        .arg("tests/refine/seqs.fa")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    // Without outgroups every block is rebuilt whole.
    assert_eq!(
        stdout,
        "in0:0:8:+\tin1:0:8:+\tog0:0:8:+\tog1:0:8:+\nin0:8:8:+\tin1:8:8:+\n"
    );

    Ok(())
}

#[test]
fn command_refine_parallel_matches_sequential() -> anyhow::Result<()> {
    let run = |parallel: bool| -> anyhow::Result<String> {
        let mut cmd = Command::cargo_bin("ppr")?;
        cmd.arg("refine")
            .arg("tests/refine/blocks.tsv")
            .arg("tests/refine/seqs.fa")
            .arg("--og-file")
            .arg("tests/refine/outgroups.txt");
        if parallel {
            cmd.arg("--parallel");
        }
        Ok(String::from_utf8(cmd.output()?.stdout)?)
    };

    assert_eq!(run(false)?, run(true)?);

    Ok(())
}

#[test]
fn command_refine_bad_table() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let table = dir.path().join("bad.tsv");
    std::fs::write(&table, "in0:0:8\n")?;

    let mut cmd = Command::cargo_bin("ppr")?;
    cmd.arg("refine")
        .arg(table.to_str().unwrap())
        .arg("tests/refine/seqs.fa")
        .assert()
        .failure()
        .stderr(predicates::str::contains("bad member"));

    Ok(())
}

#[test]
fn command_refine_missing_sequence_warns() -> anyhow::Result<()> {
    // A thread named in the table but absent from the FASTA fails at load.
    let dir = tempfile::tempdir()?;
    let table = dir.path().join("blocks.tsv");
    std::fs::write(&table, "in0:0:8:+\tnosuch:0:8:+\n")?;

    let mut cmd = Command::cargo_bin("ppr")?;
    cmd.arg("refine")
        .arg(table.to_str().unwrap())
        .arg("tests/refine/seqs.fa")
        .assert()
        .failure()
        .stderr(predicates::str::contains("no sequence"));

    Ok(())
}
