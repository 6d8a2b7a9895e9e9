//! Resource table (resources_array.cfg): one row of Slurm requests per stage.
//!
//! Example:
//! #Step                         Time      Nodes  Ntasks  Ncpus_per_task  Gres  Mem_per_cpu
//! run_01_unpack_topo_reference  00:30:00  1      1       4               0     8G
//!
//! The header names the columns; `#` is stripped from the names and columns are
//! located by name, so their order does not matter.

use crate::config::script::StageScript;
use anyhow::{Context, bail};
use std::collections::BTreeMap;
use std::fs;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRow {
    /// 0-based position in the table (data rows only).
    pub index: usize,
    pub stage: StageScript,
    /// Requested walltime, passed through verbatim.
    pub time: String,
    pub nodes: u32,
    pub ntasks: u32,
    pub ncpus_per_task: u32,
    /// GPU resource spec, e.g. "0", "1" or "gpu:1".
    pub gres: String,
    pub mem_per_cpu: String,
}

#[derive(Debug, Clone)]
pub struct ResourceTable {
    pub path: String,
    pub rows: Vec<ResourceRow>,
}

impl ResourceTable {
    /// Row whose step script names the given stage.
    pub fn find_stage(&self, name: &str) -> Option<&ResourceRow> {
        self.rows.iter().find(|r| r.stage.name == name)
    }
}

const COLUMNS: [&str; 7] = [
    "Step",
    "Time",
    "Nodes",
    "Ntasks",
    "Ncpus_per_task",
    "Gres",
    "Mem_per_cpu",
];

pub fn parse_resource_file(path: &str) -> anyhow::Result<ResourceTable> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read resource config {}", path))?;
    let table = parse_resource_text(&text, path)?;
    tracing::info!(path, rows = table.rows.len(), "parsed resource config");
    Ok(table)
}

pub(crate) fn parse_resource_text(text: &str, path: &str) -> anyhow::Result<ResourceTable> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let Some((_, header)) = lines.next() else {
        bail!("resource config {} is empty", path);
    };

    let header: Vec<String> = header
        .split_whitespace()
        .map(|c| c.replace('#', ""))
        .filter(|c| !c.is_empty())
        .collect();

    let mut col: BTreeMap<&str, usize> = BTreeMap::new();
    for name in COLUMNS {
        match header.iter().position(|h| h == name) {
            Some(i) => {
                col.insert(name, i);
            }
            None => bail!("resource config {} has no '{}' column", path, name),
        }
    }

    let mut rows = Vec::new();
    for (lno, line) in lines {
        if line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < header.len() {
            bail!(
                "resource config parse error at {}:{}: expected {} columns, found {}: {:?}",
                path,
                lno,
                header.len(),
                fields.len(),
                line
            );
        }

        let field = |name: &str| fields[col[name]];
        let number = |name: &str| -> anyhow::Result<u32> {
            field(name).parse::<u32>().with_context(|| {
                format!(
                    "resource config parse error at {}:{}: bad {} value {:?}",
                    path,
                    lno,
                    name,
                    field(name)
                )
            })
        };

        let stage = StageScript::parse(field("Step"))
            .with_context(|| format!("bad Step at {}:{}", path, lno))?;

        rows.push(ResourceRow {
            index: rows.len(),
            stage,
            time: field("Time").to_string(),
            nodes: number("Nodes")?,
            ntasks: number("Ntasks")?,
            ncpus_per_task: number("Ncpus_per_task")?,
            gres: field("Gres").to_string(),
            mem_per_cpu: field("Mem_per_cpu").to_string(),
        });
    }

    Ok(ResourceTable {
        path: path.to_string(),
        rows,
    })
}
