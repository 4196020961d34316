#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Temporary data directory plus a preconfigured CLI command.
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_data_file(&self, name: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.data_dir().join(name))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// `tasktrack` pointed at this data directory, with no ambient user.
    pub fn cmd(&self) -> Command {
        let mut cmd = tasktrack_cmd();
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd
    }

    pub fn cmd_as(&self, user: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--user", user]);
        cmd
    }

    /// Run with `--json`, assert success and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        json_output(self.cmd(), args)
    }

    pub fn json_as(&self, user: &str, args: &[&str]) -> Value {
        json_output(self.cmd_as(user), args)
    }

    pub fn new_project(&self, name: &str) -> u64 {
        let value = self.json(&["project", "new", name]);
        value["data"]["id"].as_u64().expect("project id")
    }

    pub fn new_task(&self, project: u64, title: &str) -> u64 {
        let project = project.to_string();
        let value = self.json(&["task", "new", title, "--project", &project]);
        value["data"]["id"].as_u64().expect("task id")
    }
}

pub fn tasktrack_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tasktrack").expect("binary");
    cmd.env_remove("TASKTRACK_CONFIG")
        .env_remove("TASKTRACK_DATA_DIR")
        .env_remove("TASKTRACK_USER")
        .env_remove("RUST_LOG")
        .env("TASKTRACK_ENV", "testing");
    cmd
}

fn json_output(mut cmd: Command, args: &[&str]) -> Value {
    let output = cmd
        .args(args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("json output")
}
