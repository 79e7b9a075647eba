//! Integration tests for the `naked` binary
//!
//! Writes a small model and configuration to a temporary directory and runs
//! each subcommand against them.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const MODEL: &str = r#"{
    "assemblies": [{
        "name": "Shop",
        "types": [
            {
                "full_name": "Shop.Customer",
                "properties": [
                    {"name": "Name", "property_type": {"Primitive": "String"}, "has_setter": true}
                ],
                "methods": [
                    {"name": "Rename", "parameters": [{"name": "name", "parameter_type": {"Primitive": "String"}}]}
                ]
            },
            {
                "full_name": "Shop.CustomerRepository",
                "methods": [
                    {"name": "FindByName", "return_type": {"Named": "Shop.Customer"},
                     "parameters": [{"name": "name", "parameter_type": {"Primitive": "String"}}]}
                ]
            }
        ]
    }]
}"#;

const CONFIG: &str = r#"
namespaces = ["Shop"]
services = ["Shop.CustomerRepository"]
"#;

struct Fixture {
    _dir: TempDir,
    model: PathBuf,
    config: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let model = dir.path().join("model.json");
    let config = dir.path().join("naked.toml");
    std::fs::write(&model, MODEL).expect("write model");
    std::fs::write(&config, CONFIG).expect("write config");
    Fixture {
        _dir: dir,
        model,
        config,
    }
}

fn naked(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_naked"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("NAKED_LOG")
        .output()
        .expect("naked runs")
}

fn path(p: &Path) -> &str {
    p.to_str().expect("utf-8 path")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_reflect_summarises_types_and_menus() {
    let f = fixture();
    let output = naked(&["reflect", path(&f.model), "--config", path(&f.config)]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.starts_with("Reflected "), "{}", text);
    assert!(text.contains("(1 services, 1 menus)"), "{}", text);
    assert!(text.contains("Shop.Customer "), "{}", text);
    assert!(text.contains("[service]"), "{}", text);
    assert!(text.contains("Menus:"), "{}", text);
    assert!(text.contains("(Shop.CustomerRepository::FindByName)"), "{}", text);
}

#[test]
fn test_reflect_json_output() {
    let f = fixture();
    let output = naked(&[
        "reflect",
        path(&f.model),
        "-c",
        path(&f.config),
        "--parallel",
        "--json",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let doc: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(doc["services"], serde_json::json!(["Shop.CustomerRepository"]));
    let customer = doc["specifications"]
        .as_array()
        .expect("array")
        .iter()
        .find(|s| s["name"] == "Shop.Customer")
        .expect("customer listed");
    assert_eq!(customer["fields"], 1);
    assert_eq!(customer["actions"], 1);
    assert_eq!(doc["menus"].as_array().expect("menus").len(), 1);
}

#[test]
fn test_show_describes_members() {
    let f = fixture();
    let output = naked(&["show", path(&f.model), "Shop.Customer", "--config", path(&f.config)]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.starts_with("Shop.Customer (Customer)"), "{}", text);
    assert!(text.contains("Properties:"), "{}", text);
    assert!(text.contains("Name: System.String"), "{}", text);
    assert!(text.contains("Rename(name: System.String) -> System.Void"), "{}", text);
}

#[test]
fn test_show_json_is_the_specification() {
    let f = fixture();
    let output = naked(&[
        "show",
        path(&f.model),
        "Shop.CustomerRepository",
        "--config",
        path(&f.config),
        "--json",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let doc: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(doc["payload"]["Object"]["is_service"], true);
}

#[test]
fn test_show_unknown_type_fails() {
    let f = fixture();
    let output = naked(&["show", path(&f.model), "Shop.Missing", "--config", path(&f.config)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown type: Shop.Missing"));
}

#[test]
fn test_missing_model_fails() {
    let f = fixture();
    let missing = f.model.with_file_name("absent.json");
    let output = naked(&["reflect", path(&missing)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read model"));
}

#[test]
fn test_bad_config_fails() {
    let f = fixture();
    std::fs::write(&f.config, "namespaces = 3").expect("overwrite config");
    let output = naked(&["reflect", path(&f.model), "--config", path(&f.config)]);
    assert!(!output.status.success());
}

#[test]
fn test_log_level_from_environment() {
    let f = fixture();
    let output = Command::new(env!("CARGO_BIN_EXE_naked"))
        .args(["reflect", path(&f.model), "--config", path(&f.config)])
        .env("NO_COLOR", "1")
        .env("NAKED_LOG", "info")
        .output()
        .expect("naked runs");
    assert!(output.status.success());
    assert!(stderr(&output).contains("framework built"), "{}", stderr(&output));

    let quiet = naked(&["reflect", path(&f.model), "--config", path(&f.config)]);
    assert!(!stderr(&quiet).contains("framework built"));
}

#[test]
fn test_factories_lists_the_chain() {
    let output = naked(&["factories"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("facet factories"));
    assert!(text.contains("ActionMethods"));
    assert!(text.contains("PropertyMethods"));

    let prefixes = stdout(&naked(&["factories", "--prefixes"]));
    let lines: Vec<&str> = prefixes.lines().collect();
    assert!(lines.contains(&"Validate"));
    assert!(lines.contains(&"Hide"));
}
