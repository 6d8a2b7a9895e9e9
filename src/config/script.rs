//! Step-script naming convention.
//!
//! topsStack writes its run files as `run_<NN>_<stage name>`, e.g.
//! `run_05_fullBurst_geo2rdr`. The stage name is what the generated sbatch
//! scripts log as the step in the timings files.

use anyhow::{Context, bail};
use regex::Regex;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageScript {
    /// Script path as written in the resource table.
    pub script: String,
    /// Two-digit stage number, e.g. "05".
    pub number: String,
    /// Stage name, e.g. "fullBurst_geo2rdr".
    pub name: String,
}

impl StageScript {
    /// Split a step-script path into stage number and name. Only the file
    /// name component is matched, so `run_files/run_01_x` is accepted.
    pub fn parse(script: &str) -> anyhow::Result<Self> {
        let file_name = Path::new(script)
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("step script has no file name: {:?}", script))?;

        let re = Regex::new(r#"^run_(\d{2})_(.+)$"#)?;
        let Some(caps) = re.captures(file_name) else {
            bail!(
                "step script {:?} does not follow the run_<NN>_<name> convention",
                script
            );
        };

        Ok(Self {
            script: script.to_string(),
            number: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }

    /// File name component of the script, used to name outputs.
    pub fn file_name(&self) -> &str {
        Path::new(&self.script)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.script)
    }
}
