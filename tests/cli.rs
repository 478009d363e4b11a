//! Binary surface tests for `dca-analyze`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const HEADER: &str =
    "snid,sntime,time,t_air,t_soil,h_air,h_soil,x_nt,x_vs,x_bat,x_art,x_rst,x_ic,x_adc,x_usart,success,supply";

#[test]
fn print_default_config_emits_toml() {
    Command::cargo_bin("dca-analyze")
        .unwrap()
        .arg("--print-default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("window_size = 10"))
        .stdout(predicate::str::contains("decision_rule = \"k-sign-retire\""));
}

#[test]
fn analyze_writes_one_csv_per_node() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("telemetry.csv");
    let mut file = std::fs::File::create(&input).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for seq in 1..=10u32 {
        writeln!(
            file,
            "41B9F864,{seq},2021-11-15 08:{:02}:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
            seq % 60
        )
        .unwrap();
        writeln!(
            file,
            "41CC57CC,{seq},2021-11-15 08:{:02}:30,22.0,17.5,48.0,59.0,0,0,0,0,0,0,0,0,1,3.3",
            seq % 60
        )
        .unwrap();
    }
    drop(file);

    let out_dir = dir.path().join("out");
    Command::cargo_bin("dca-analyze")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(out_dir.join("centralized_dca-41B9F864-output.csv").exists());
    assert!(out_dir.join("centralized_dca-41CC57CC-output.csv").exists());
}

#[test]
fn node_filter_limits_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("telemetry.csv");
    let mut file = std::fs::File::create(&input).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for seq in 1..=3u32 {
        writeln!(
            file,
            "41B9F864,{seq},2021-11-15 08:0{seq}:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3"
        )
        .unwrap();
        writeln!(
            file,
            "41CC57CC,{seq},2021-11-15 08:0{seq}:30,22.0,17.5,48.0,59.0,0,0,0,0,0,0,0,0,1,3.3"
        )
        .unwrap();
    }
    drop(file);

    let out_dir = dir.path().join("out");
    Command::cargo_bin("dca-analyze")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--node")
        .arg("41CC57CC")
        .assert()
        .success();

    assert!(!out_dir.join("centralized_dca-41B9F864-output.csv").exists());
    assert!(out_dir.join("centralized_dca-41CC57CC-output.csv").exists());
}

#[test]
fn missing_input_fails() {
    Command::cargo_bin("dca-analyze")
        .unwrap()
        .arg("--input")
        .arg("/nonexistent/telemetry.csv")
        .assert()
        .failure();
}
