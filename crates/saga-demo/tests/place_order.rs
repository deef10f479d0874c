use std::fs;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn write_config(content: &str) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("saga.toml"), content).expect("failed to write saga.toml");
    dir
}

#[test]
fn successful_order_prints_receipt() {
    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--quantity")
        .arg("3")
        .assert()
        .success()
        .stdout(contains("order placed"))
        .stdout(contains("RSV-0003"))
        .stdout(contains("$29.97"))
        .stdout(contains("TRK-RSV-0003"))
        .stdout(contains("✓ Ship order"));
}

#[test]
fn failing_charge_rolls_back_reservation() {
    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--fail-at")
        .arg("charge")
        .assert()
        .failure()
        .stdout(contains("order placed").not())
        .stderr(contains("↩ Reserve stock"))
        .stderr(contains("↩ Charge payment"))
        .stderr(contains("Ship order").not())
        .stderr(contains("saga step 'charge' failed"))
        .stderr(contains("injected failure at step 'charge'"));
}

#[test]
fn failing_ship_skips_missing_compensator() {
    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--fail-at")
        .arg("ship")
        .assert()
        .failure()
        .stderr(contains("- Ship order"))
        .stderr(contains("↩ Charge payment"))
        .stderr(contains("↩ Reserve stock"))
        .stderr(contains("no compensator declared"));
}

#[test]
fn zero_quantity_is_rejected() {
    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--quantity")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("order quantity must be positive"));
}

#[test]
fn slow_saga_times_out() {
    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--delay-ms")
        .arg("300")
        .arg("--timeout-ms")
        .arg("50")
        .assert()
        .failure()
        .stderr(contains("saga run did not complete within"));
}

#[test]
fn configured_policies_are_applied() {
    let dir = write_config(
        r#"
[pattern.saga]
default-timeout-secs = 10
cancellation = "compensate-and-stop"

[pattern.cqrs]
duplicate-commands = "reject"
"#,
    );

    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--config")
        .arg(dir.path().join("saga.toml"))
        .assert()
        .success()
        .stdout(contains("order placed"));
}

#[test]
fn disabled_cqrs_pattern_refuses_to_run() {
    let dir = write_config(
        r"
[pattern.cqrs]
enabled = false
",
    );

    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--config")
        .arg(dir.path().join("saga.toml"))
        .assert()
        .failure()
        .stderr(contains("cqrs pattern is disabled in configuration"));
}

#[test]
fn zero_timeout_in_config_is_rejected() {
    let dir = write_config(
        r"
[pattern.saga]
default-timeout-secs = 0
",
    );

    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--config")
        .arg(dir.path().join("saga.toml"))
        .assert()
        .failure()
        .stderr(contains("error: configuration error"))
        .stderr(contains("pattern.saga.default-timeout-secs"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().expect("failed to create temp dir");

    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(contains("failed to read config file"));
}

#[test]
fn unknown_step_name_is_a_usage_error() {
    assert_cmd::cargo::cargo_bin_cmd!("saga-demo")
        .arg("--fail-at")
        .arg("refund")
        .assert()
        .failure()
        .stderr(contains("invalid value 'refund'"));
}
