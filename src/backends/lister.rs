//! Lister - executes the remote "list" operation for a family
//!
//! The remote call may block for an unbounded time, which is exactly why
//! callers run it under the watchdog (see `flows::watchdog`).

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::process::{Command, Stdio};

use crate::core::registry::FamilyConfig;

/// Source of raw result items for one resource family.
pub trait Lister {
    fn list(&self, family: &FamilyConfig, params: &HashMap<String, String>) -> Result<Vec<Value>>;
}

/// Runs the family's configured list command and parses its stdout.
///
/// Supplied parent parameters are appended as `--key value` pairs. The
/// child's stderr is discarded so the candidate stream stays clean.
pub struct CommandLister;

impl Lister for CommandLister {
    fn list(&self, family: &FamilyConfig, params: &HashMap<String, String>) -> Result<Vec<Value>> {
        let mut argv = family.list_command.clone();
        if argv.is_empty() {
            bail!("no list command configured for {}", family.collection);
        }
        for param in &family.params {
            if let Some(value) = params.get(param) {
                argv.push(format!("--{param}"));
                argv.push(value.clone());
            }
        }

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run list command: {}", argv[0]))?;
        if !output.status.success() {
            bail!("list command {} exited with {}", argv[0], output.status);
        }

        parse_items(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse list output as a JSON array, or as JSONL with one item per line.
pub fn parse_items(raw: &str) -> Result<Vec<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("List output is not a JSON array");
    }
    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("List output line is not JSON"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_family(list_command: &[&str]) -> FamilyConfig {
        FamilyConfig {
            collection: "test.widgets".to_string(),
            template: "https://api.example.com/test/v1/projects/{project}/widgets/+".to_string(),
            params: vec!["project".to_string()],
            list_command: list_command.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_items_array() {
        let items = parse_items(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "a");
    }

    #[test]
    fn test_parse_items_jsonl() {
        let items = parse_items("{\"name\": \"a\"}\n\n{\"name\": \"b\"}\n").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["name"], "b");
    }

    #[test]
    fn test_parse_items_empty() {
        assert!(parse_items("").unwrap().is_empty());
        assert!(parse_items("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_items_garbage_is_an_error() {
        assert!(parse_items("not json").is_err());
    }

    #[test]
    fn test_command_lister_runs_argv() {
        // Extra parameter args land in $0/$1 of the -c script and are ignored.
        let family = widget_family(&["sh", "-c", r#"echo '[{"name": "alpha"}]'"#]);
        let mut params = HashMap::new();
        params.insert("project".to_string(), "p".to_string());

        let items = CommandLister.list(&family, &params).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "alpha");
    }

    #[test]
    fn test_command_lister_failure_is_an_error() {
        let family = widget_family(&["sh", "-c", "exit 3"]);
        assert!(CommandLister.list(&family, &HashMap::new()).is_err());
    }

    #[test]
    fn test_command_lister_without_command_is_an_error() {
        let family = widget_family(&[]);
        assert!(CommandLister.list(&family, &HashMap::new()).is_err());
    }
}
