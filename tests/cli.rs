use assert_cmd::Command;
use predicates::prelude::*;

fn scanner() -> Command {
    let mut cmd = Command::cargo_bin("chart-image-scanner").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("CHART_SCANNER_CONFIG");
    cmd
}

#[test]
fn manifest_lists_images() {
    scanner()
        .args(["manifest", "tests/fixtures/manifests/web.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("myregistry.io:5000/team/app:v2\nnginx:latest\n"))
        .stdout(predicate::str::contains("busybox").not());
}

#[test]
fn manifest_reads_stdin() {
    scanner()
        .args(["manifest", "-"])
        .write_stdin("spec:\n  containers:\n    - image: redis\n")
        .assert()
        .success()
        .stdout("redis:latest\n");
}

#[test]
fn manifest_json_with_values() {
    scanner()
        .args([
            "manifest",
            "tests/fixtures/manifests/empty.yaml",
            "-f",
            "tests/fixtures/charts/web/values.yaml",
            "-f",
            "tests/fixtures/values/prod.yaml",
            "--json",
        ])
        .assert()
        .success()
        .stdout(
            "[\"docker.io/prom/statsd-exporter:v0.27.0\",\"nginx:1.25\",\"redis:7\"]\n",
        );
}

#[test]
fn manifest_without_values_tree() {
    scanner()
        .args([
            "manifest",
            "tests/fixtures/manifests/empty.yaml",
            "-f",
            "tests/fixtures/values/prod.yaml",
            "--no-values-tree",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No image fields found"));
}

#[test]
fn raw_mode_keeps_images_as_written() {
    scanner()
        .args(["manifest", "-", "--raw"])
        .write_stdin("image: nginx\n")
        .assert()
        .success()
        .stdout("nginx\n");
}

#[test]
fn report_includes_warnings() {
    scanner()
        .args(["manifest", "tests/fixtures/manifests/web.yaml", "--report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"warnings\""))
        .stdout(predicate::str::contains("structural-parse"));
}

#[test]
fn scan_missing_chart() {
    scanner()
        .args(["scan", "tests/fixtures/charts/does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Chart path not found"));
}

#[test]
fn scan_directory_without_chart_yaml() {
    scanner()
        .args(["scan", "tests/fixtures/manifests"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a valid Helm chart directory"));
}

#[test]
fn scan_missing_values_file() {
    scanner()
        .args(["scan", "tests/fixtures/charts/web", "-f", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Values file not found"));
}

#[test]
fn explicit_missing_config() {
    scanner()
        .args(["-c", "/nonexistent/.chart-scanner.toml", "manifest", "-"])
        .write_stdin("image: nginx\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn help_lists_subcommands() {
    scanner()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("manifest"))
        .stdout(predicate::str::contains("serve"));
}
