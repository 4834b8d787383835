use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, diff};

fn ls8() -> Command {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.env_remove("LS8_TRACE").env_remove("LS8_MINIMAL");
    cmd
}

#[test]
fn runs_without_arguments() {
    ls8().assert().success().stdout(contains("--help"));
}

#[test]
fn multiplies() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/mult.ls8").arg("--minimal");
    cmd.assert().success().stdout(diff("72\n"));
}

#[test]
fn quick_run_reports_status() {
    let mut cmd = ls8();
    cmd.arg("tests/files/print8.ls8");
    cmd.assert()
        .success()
        .stdout(contains("8\n"))
        .stdout(contains("Running"))
        .stdout(contains("Halted"));
}

#[test]
fn calls_subroutine() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/call.ls8").arg("--minimal");
    cmd.assert().success().stdout(diff("20\n30\n36\n60\n"));
}

#[test]
fn swaps_through_stack() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/stack.ls8").arg("--minimal");
    cmd.assert().success().stdout(diff("2\n1\n"));
}

#[test]
fn branches_on_compare() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/compare.ls8").arg("--minimal");
    cmd.assert().success().stdout(diff("1\n3\n"));
}

#[test]
fn aborts_on_unknown_opcode() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/bad_opcode.ls8").arg("--minimal");
    cmd.assert()
        .failure()
        .stdout(diff(""))
        .stderr(contains("Unsupported opcode"))
        .stderr(contains("runtime::unsupported_opcode"));
}

#[test]
fn rejects_malformed_program() {
    let mut cmd = ls8();
    cmd.arg("run").arg("tests/files/malformed.ls8").arg("--minimal");
    cmd.assert()
        .failure()
        .stderr(contains("Malformed program line"))
        .stderr(contains("load::bad_lit"));

    let mut cmd = ls8();
    cmd.arg("check").arg("tests/files/malformed.ls8");
    cmd.assert().failure();
}

#[test]
fn checks_valid_program() {
    let mut cmd = ls8();
    cmd.arg("check").arg("tests/files/call.ls8");
    cmd.assert().success().stdout(contains("no errors found!"));
}

#[test]
fn rejects_unknown_extension() {
    let mut cmd = ls8();
    cmd.arg("run").arg("Cargo.toml");
    cmd.assert()
        .failure()
        .stderr(contains("unknown extension"));
}

#[test]
fn traces_each_instruction() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--minimal")
        .arg("--trace");
    cmd.assert()
        .success()
        .stdout(diff("8\n"))
        .stderr(contains("TRACE: 00 | 82 00 08 |"))
        .stderr(contains("TRACE: 03 | 47 00 01 | 08 00 00 00 00 00 00 00 | PRN R0"))
        .stderr(contains("TRACE: 05 | 01 00 00 |"));
}

#[test]
fn traces_from_environment() {
    let mut cmd = ls8();
    cmd.env("LS8_TRACE", "1")
        .arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--minimal");
    cmd.assert()
        .success()
        .stderr(contains("TRACE: 00 | 82 00 08 |"));
}

#[test]
fn dumps_registers() {
    let mut cmd = ls8();
    cmd.arg("run")
        .arg("tests/files/mult.ls8")
        .arg("--minimal")
        .arg("--registers");
    cmd.assert()
        .success()
        .stderr(contains("R0 72\nR1 9\n"))
        .stderr(contains("PC 11\nSP 243\nFL Unset\n"));
}

#[test]
fn compiles_and_runs_binary() {
    let dest = std::env::temp_dir().join(format!("ls8-mult-{}.bin", std::process::id()));

    let mut cmd = ls8();
    cmd.arg("compile").arg("tests/files/mult.ls8").arg(&dest);
    cmd.assert().success().stdout(contains("Saved"));

    let image = std::fs::read(&dest).unwrap();
    assert_eq!(image.len(), 12);
    assert_eq!(image[0], 0b1000_0010);

    let mut cmd = ls8();
    cmd.arg("run").arg(&dest).arg("--minimal");
    cmd.assert()
        .success()
        .stdout(diff("72\n"))
        .stderr(predicate::str::is_empty());

    std::fs::remove_file(&dest).unwrap();
}

#[test]
fn minimal_from_environment() {
    let mut cmd = ls8();
    cmd.env("LS8_MINIMAL", "true")
        .arg("run")
        .arg("tests/files/mult.ls8");
    cmd.assert().success().stdout(diff("72\n"));
}
