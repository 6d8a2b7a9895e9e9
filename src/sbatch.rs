//! Sbatch generation: one Slurm array-job script per resource table row.

use crate::config::{ResourceRow, ResourceTable};
use crate::error::ToolError;
use crate::render::{SbatchContext, render_sbatch};
use crate::Result;
use anyhow::{Context, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Stage whose CPUs per node are capped at a quarter of the limit.
const UNWRAP_STAGE: &str = "unwrap";

#[derive(Debug, Clone)]
pub struct SbatchOptions {
    pub track: String,
    /// Where the scripts go; the config file's directory when unset, so the
    /// step-script paths inside them resolve at submission.
    pub out_dir: Option<PathBuf>,
    pub cpus_per_node_limit: u32,
    pub account: String,
    pub mail_user: String,
}

/// CPUs each node has to provide for this row's request.
pub fn cpus_per_node(row: &ResourceRow) -> Result<f64> {
    if row.nodes == 0 {
        bail!("{}: node count must be at least 1", row.stage.script);
    }
    Ok(f64::from(row.ntasks) * f64::from(row.ncpus_per_task) / f64::from(row.nodes))
}

/// Reject rows asking for more CPUs per node than the nodes have. The unwrap
/// stage is memory bound and gets a quarter of the limit.
pub fn check_cpu_limits(row: &ResourceRow, limit: u32) -> Result<f64> {
    let per_node = cpus_per_node(row)?;

    if per_node > f64::from(limit) {
        return Err(ToolError::CpusPerNode {
            script: row.stage.script.clone(),
            cpus_per_node: per_node,
            limit,
        }
        .into());
    }

    let unwrap_limit = f64::from(limit) / 4.0;
    if row.stage.name == UNWRAP_STAGE && per_node > unwrap_limit {
        return Err(ToolError::UnwrapCpusPerNode {
            script: row.stage.script.clone(),
            cpus_per_node: per_node,
            limit: unwrap_limit,
        }
        .into());
    }

    Ok(per_node)
}

/// Number of command lines in a step script; each becomes one array task.
pub fn count_commands(path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read step script {}", path.display()))?;
    Ok(text.lines().count())
}

/// Write `<script>.sbatch` for every row, in table order.
///
/// The first row that fails a check aborts the run; scripts already written
/// for earlier rows stay on disk.
pub fn write_sbatch_files(table: &ResourceTable, opts: &SbatchOptions) -> Result<Vec<PathBuf>> {
    let base = Path::new(&table.path).parent().unwrap_or(Path::new(""));
    let out_dir = opts.out_dir.as_deref().unwrap_or(base);

    let mut written = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let script_path = base.join(&row.stage.script);
        let cmd_num = count_commands(&script_path)?;
        if cmd_num == 0 {
            bail!("step script {} has no commands", script_path.display());
        }

        let per_node = check_cpu_limits(row, opts.cpus_per_node_limit)?;
        tracing::debug!(
            script = %row.stage.script,
            cmd_num,
            cpus_per_node = per_node,
            "stage checks passed"
        );

        let script_name = row.stage.file_name();
        let ctx = SbatchContext {
            account: opts.account.clone(),
            mail_user: opts.mail_user.clone(),
            track: opts.track.clone(),
            step_index: row.index + 1,
            step_num: row.stage.number.clone(),
            step_name: row.stage.name.clone(),
            step_script: row.stage.script.clone(),
            log_name: format!("slurm-{}-%A_%a.out", script_name),
            time: row.time.clone(),
            nodes: row.nodes,
            ntasks: row.ntasks,
            ncpus_per_task: row.ncpus_per_task,
            gres: row.gres.clone(),
            mem_per_cpu: row.mem_per_cpu.clone(),
            cmd_num,
        };

        let out = out_dir.join(format!("{}.sbatch", script_name));
        fs::write(&out, render_sbatch(&ctx))
            .with_context(|| format!("write sbatch file {}", out.display()))?;
        tracing::info!(path = %out.display(), "wrote sbatch file");
        written.push(out);
    }

    Ok(written)
}
