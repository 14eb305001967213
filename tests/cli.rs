use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn entrap_rust(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_entrap-rust"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn features_writes_protein_and_peptide_rows() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("db.fasta");
    fs::write(&fasta, ">p1 first\nELVISK\nLIVESR\n>p2\nMKTAYIAKQR\n").unwrap();
    let out = dir.path().join("features.tsv");

    let res = entrap_rust(&["features", "-i", path_str(&fasta), "-o", path_str(&out), "--db-type", "trap"]);
    assert!(res.status.success(), "stderr: {}", String::from_utf8_lossy(&res.stderr));

    let text = fs::read_to_string(&out).unwrap();
    let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows[0][..4], ["kind", "db_type", "name", "length"]);
    let named: Vec<(&str, &str)> = rows[1..].iter().map(|r| (r[0], r[2])).collect();
    assert_eq!(
        named,
        vec![
            ("protein", "p1 first"),
            ("peptide", "ELVISK"),
            ("peptide", "LIVESR"),
            ("protein", "p2"),
            ("peptide", "TAYIAK"),
        ]
    );
    assert!(rows[1..].iter().all(|r| r[1] == "trap" && r.len() == rows[0].len()));
    assert_eq!(rows[1][3], "12");
}

#[test]
fn features_honours_rule_flag() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("db.fasta");
    fs::write(&fasta, ">p1\nMMMMMWKPAAAAAR\n").unwrap();
    let out = dir.path().join("features.tsv");

    let peptides = |extra: &[&str]| {
        let mut args = vec!["features", "-i", path_str(&fasta), "-o", path_str(&out)];
        args.extend_from_slice(extra);
        let res = entrap_rust(&args);
        assert!(res.status.success(), "stderr: {}", String::from_utf8_lossy(&res.stderr));
        fs::read_to_string(&out)
            .unwrap()
            .lines()
            .filter(|l| l.starts_with("peptide\t"))
            .map(|l| l.split('\t').nth(2).unwrap().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(peptides(&[]), vec!["MMMMMWK", "PAAAAAR"]);
    assert_eq!(peptides(&["--rule", "trypsin-strict"]), vec!["MMMMMWKPAAAAAR"]);
}

#[test]
fn features_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("features.tsv");
    let missing = dir.path().join("missing.fasta");

    let res = entrap_rust(&["features", "-i", path_str(&missing), "-o", path_str(&out)]);
    assert!(!res.status.success());
    assert!(String::from_utf8_lossy(&res.stderr).contains("cannot load FASTA"));
    assert!(!out.exists());
}

#[test]
fn build_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let host = dir.path().join("host.fasta");
    let trap = dir.path().join("trap.fasta");
    fs::write(&host, ">h1\nMKTAYIAKQR\n").unwrap();
    fs::write(&trap, ">t_far\nWWWWWWWWCCCC\n>t_same\nRQKAIYATKM\n").unwrap();
    let out = dir.path().join("out");

    let res = entrap_rust(&[
        "build",
        "-i",
        path_str(&host),
        "-t",
        path_str(&trap),
        "-o",
        path_str(&out),
        "-j",
        "1",
        "--no-qc",
    ]);
    assert!(res.status.success(), "stderr: {}", String::from_utf8_lossy(&res.stderr));
    assert!(String::from_utf8_lossy(&res.stdout).contains("unique traps chosen:  1"));
    assert_eq!(
        fs::read_to_string(out.join("entrapment.fasta")).unwrap(),
        ">h1\nMKTAYIAKQR\n>t_same\nRQKAIYATKM\n"
    );
    assert!(out.join("summary.json").is_file());
    assert!(!out.join("qc_features.tsv").exists());
}
