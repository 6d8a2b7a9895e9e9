//! Aggregation model: combine the timings log with the resource table.

use crate::config::{GpuStages, ResourceTable};
use crate::error::ToolError;
use crate::log::{TimingLog, TimingRecord};
use crate::Result;
use serde::Serialize;

/// Hourly rate charged per CPU unit, in dollars.
pub const DEFAULT_RATE: f64 = 0.008;

/// A GPU is charged as this many CPUs.
pub const GPU_CPU_EQUIVALENT: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub step: String,
    pub job_id: u64,
    pub num_jobs: usize,
    /// Earliest array-task start (Unix seconds).
    pub start: i64,
    /// Latest array-task finish (Unix seconds).
    pub finish: i64,
    /// finish - start, seconds.
    pub total_elapsed: i64,
    /// Gap since the previous stage finished (or since submission), seconds.
    pub queue_time: i64,
    pub array_mean: f64,
    /// None for single-task stages.
    pub array_std: Option<f64>,
    pub cpus: u32,
    pub gpus: u32,
    pub cpu_units: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    /// Submission time (Unix seconds).
    pub submitted: i64,
    pub total_time: i64,
    pub total_run_time: i64,
    pub total_queue_time: i64,
    pub total_cpu_units: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub totals: TotalsView,
    pub stages: Vec<StageSummary>,
}

/// Per-step group of records, in first-seen order.
struct StageGroup<'a> {
    step: &'a str,
    records: Vec<&'a TimingRecord>,
}

/// Build report data. Performs:
/// - group records by step (first-seen order), rejecting restarted runs
/// - per-stage start/finish/span and array statistics
/// - queue times and run totals
/// - join each stage to its resource row by stage name and price it
pub fn build_report_data(
    log: &TimingLog,
    resources: &ResourceTable,
    gpu: &GpuStages,
    rate: f64,
) -> Result<ReportData> {
    let groups = group_by_step(&log.records)?;

    let mut stages: Vec<StageSummary> = Vec::with_capacity(groups.len());
    for group in &groups {
        let start = group.records.iter().map(|r| r.start).min().unwrap_or_default();
        let finish = group.records.iter().map(|r| r.finish).max().unwrap_or_default();

        let elapsed: Vec<f64> = group.records.iter().map(|r| r.elapsed).collect();
        let (array_mean, array_std) = mean_std(&elapsed);

        let queue_time = match stages.last() {
            Some(prev) => start - prev.finish,
            None => start - log.submitted,
        };

        let row = resources
            .find_stage(group.step)
            .ok_or_else(|| ToolError::MissingStageConfig {
                step: group.step.to_string(),
            })?;

        let cpus = row.ncpus_per_task;
        let gpus = gpu.gpus_for(row);
        let num_jobs = group.records.len();
        let cpu_units = cpu_units(cpus, gpus, num_jobs, array_mean);

        stages.push(StageSummary {
            step: group.step.to_string(),
            job_id: group.records[0].job_id,
            num_jobs,
            start,
            finish,
            total_elapsed: finish - start,
            queue_time,
            array_mean,
            array_std,
            cpus,
            gpus,
            cpu_units,
            cost: cpu_units * rate,
        });
    }

    for row in &resources.rows {
        if !stages.iter().any(|s| s.step == row.stage.name) {
            tracing::debug!(script = %row.stage.script, "no timing records for config row");
        }
    }

    let total_run_time: i64 = stages.iter().map(|s| s.total_elapsed).sum();
    let end_time = stages.last().map(|s| s.finish).unwrap_or(log.submitted);
    let total_time = end_time - log.submitted;

    Ok(ReportData {
        totals: TotalsView {
            submitted: log.submitted,
            total_time,
            total_run_time,
            total_queue_time: total_time - total_run_time,
            total_cpu_units: stages.iter().map(|s| s.cpu_units).sum(),
            total_cost: stages.iter().map(|s| s.cost).sum(),
        },
        stages,
    })
}

/// (CPUs per task + GPU weight) x tasks x mean hours.
pub fn cpu_units(cpus: u32, gpus: u32, num_jobs: usize, mean_seconds: f64) -> f64 {
    f64::from(cpus + gpus * GPU_CPU_EQUIVALENT) * num_jobs as f64 * (mean_seconds / 3600.0)
}

fn group_by_step(records: &[TimingRecord]) -> Result<Vec<StageGroup<'_>>> {
    let mut groups: Vec<StageGroup<'_>> = Vec::new();

    for rec in records {
        if let Some(g) = groups.last_mut().filter(|g| g.step == rec.step) {
            let job_id = g.records[0].job_id;
            if rec.job_id != job_id {
                return Err(ToolError::RestartedRun {
                    step: rec.step.clone(),
                    reason: format!("ran under job ids {} and {}", job_id, rec.job_id),
                }
                .into());
            }
            if g.records.iter().any(|r| r.array_id == rec.array_id) {
                return Err(ToolError::RestartedRun {
                    step: rec.step.clone(),
                    reason: format!("repeats array task {}", rec.array_id),
                }
                .into());
            }
            g.records.push(rec);
            continue;
        }

        if groups.iter().any(|g| g.step == rec.step) {
            return Err(ToolError::RestartedRun {
                step: rec.step.clone(),
                reason: "reappears after a later step started".to_string(),
            }
            .into());
        }
        groups.push(StageGroup {
            step: &rec.step,
            records: vec![rec],
        });
    }

    Ok(groups)
}

/// Mean and population standard deviation. The deviation is None for fewer
/// than two samples.
fn mean_std(xs: &[f64]) -> (f64, Option<f64>) {
    if xs.is_empty() {
        return (0.0, None);
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    if xs.len() < 2 {
        return (mean, None);
    }
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, Some(var.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resources::parse_resource_text;
    use crate::log::parse::parse_timing_text;
    use pretty_assertions::assert_eq;

    const CFG: &str = "\
#Step                          Time      Nodes Ntasks Ncpus_per_task Gres Mem_per_cpu
run_01_unpack_topo_reference   1:00:00   1     1      4              0    8G
run_02_unpack_secondary_slc    1:00:00   1     1      2              0    8G
run_03_average_baseline        1:00:00   1     1      1              0    8G
run_04_extract_burst_overlaps  1:00:00   1     1      1              0    8G
run_05_overlap_geo2rdr         1:00:00   1     1      2              1    8G
";

    const LOG: &str = "\
Submitted (unix):   1000
Step JobID ArrayID Start Finish Elapsed
unpack_topo_reference  11 1 1100 1400 300
unpack_secondary_slc   12 1 1500 1700 200
unpack_secondary_slc   12 2 1510 1810 300
unpack_secondary_slc   12 3 1520 1920 400
average_baseline       13 1 2000 2060 60
extract_burst_overlaps 14 1 2100 2160 60
overlap_geo2rdr        15 1 2200 5800 3600
overlap_geo2rdr        15 2 2200 5800 3600
";

    fn build(log: &str, gpu: &GpuStages) -> Result<ReportData> {
        let log = parse_timing_text(log, "time_unix.txt")?;
        let cfg = parse_resource_text(CFG, "resources_array.cfg")?;
        build_report_data(&log, &cfg, gpu, DEFAULT_RATE)
    }

    fn default_gpu() -> GpuStages {
        GpuStages::parse_rows("4,8").unwrap()
    }

    #[test]
    fn one_summary_per_stage_in_log_order() {
        let data = build(LOG, &default_gpu()).unwrap();
        let steps: Vec<(&str, usize)> = data
            .stages
            .iter()
            .map(|s| (s.step.as_str(), s.num_jobs))
            .collect();
        assert_eq!(
            steps,
            vec![
                ("unpack_topo_reference", 1),
                ("unpack_secondary_slc", 3),
                ("average_baseline", 1),
                ("extract_burst_overlaps", 1),
                ("overlap_geo2rdr", 2),
            ]
        );
    }

    #[test]
    fn stage_span_and_array_statistics() {
        let data = build(LOG, &default_gpu()).unwrap();
        let s = &data.stages[1];
        assert_eq!((s.start, s.finish, s.total_elapsed), (1500, 1920, 420));
        assert_eq!(s.job_id, 12);
        assert_eq!(s.array_mean, 300.0);
        // Population deviation of 200, 300, 400.
        let std = s.array_std.unwrap();
        assert!((std - (20_000.0f64 / 3.0).sqrt()).abs() < 1e-9, "{}", std);
        assert_eq!(data.stages[0].array_std, None);
    }

    #[test]
    fn queue_times_chain_from_submission() {
        let data = build(LOG, &default_gpu()).unwrap();
        let queue: Vec<i64> = data.stages.iter().map(|s| s.queue_time).collect();
        assert_eq!(queue, vec![100, 100, 80, 40, 40]);
    }

    #[test]
    fn totals_identity_holds() {
        let data = build(LOG, &default_gpu()).unwrap();
        let t = &data.totals;
        let spans: i64 = data.stages.iter().map(|s| s.total_elapsed).sum();
        assert_eq!(t.total_run_time, spans);
        assert_eq!(t.total_time, 5800 - 1000);
        assert_eq!(t.total_queue_time, t.total_time - t.total_run_time);
        let queues: i64 = data.stages.iter().map(|s| s.queue_time).sum();
        assert_eq!(t.total_queue_time, queues);
    }

    #[test]
    fn cost_for_cpu_stage() {
        let data = build(LOG, &default_gpu()).unwrap();
        let s = &data.stages[1];
        assert_eq!((s.cpus, s.gpus), (2, 0));
        let expected = 2.0 * 3.0 * (300.0 / 3600.0) * 0.008;
        assert!((s.cost - expected).abs() < 1e-12, "{} vs {}", s.cost, expected);
    }

    #[test]
    fn gpu_stage_is_charged_ten_cpus() {
        let data = build(LOG, &default_gpu()).unwrap();
        let s = &data.stages[4];
        assert_eq!((s.cpus, s.gpus), (2, 1));
        // (2 + 10) cpus x 2 jobs x 1 hour.
        assert!((s.cpu_units - 24.0).abs() < 1e-12);
        assert!((s.cost - 24.0 * 0.008).abs() < 1e-12);

        let total: f64 = data.stages.iter().map(|s| s.cost).sum();
        assert!((data.totals.total_cost - total).abs() < 1e-12);
    }

    #[test]
    fn gpu_policy_comes_from_input() {
        let data = build(LOG, &GpuStages::parse_rows("0").unwrap()).unwrap();
        let gpus: Vec<u32> = data.stages.iter().map(|s| s.gpus).collect();
        assert_eq!(gpus, vec![1, 0, 0, 0, 0]);

        let data = build(LOG, &GpuStages::FromGres).unwrap();
        let gpus: Vec<u32> = data.stages.iter().map(|s| s.gpus).collect();
        assert_eq!(gpus, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn joins_config_by_stage_name() {
        // Log order differs from config order; each stage still gets its own row.
        let log = "\
submitted 0
header
average_baseline       13 1 10 20 10
unpack_topo_reference  11 1 30 40 10
";
        let data = build(log, &default_gpu()).unwrap();
        assert_eq!(data.stages[0].cpus, 1);
        assert_eq!(data.stages[1].cpus, 4);
    }

    #[test]
    fn stage_without_config_row_is_an_error() {
        let log = "submitted 0\nheader\nunwrap 20 1 10 20 10\n";
        let err = build(log, &default_gpu()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ToolError>(),
            Some(&ToolError::MissingStageConfig {
                step: "unwrap".to_string()
            })
        );
    }

    #[test]
    fn reappearing_step_is_rejected() {
        let log = "\
submitted 0
header
unpack_topo_reference  11 1 10 20 10
average_baseline       13 1 30 40 10
unpack_topo_reference  21 1 50 60 10
";
        let err = build(log, &default_gpu()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::RestartedRun { step, .. }) if step == "unpack_topo_reference"
        ));
    }

    #[test]
    fn repeated_array_task_is_rejected() {
        let log = "\
submitted 0
header
average_baseline 13 1 10 20 10
average_baseline 13 2 10 20 10
average_baseline 13 1 30 40 10
";
        let err = build(log, &default_gpu()).unwrap_err();
        assert!(err.to_string().contains("repeats array task 1"), "{}", err);
    }

    #[test]
    fn step_with_two_job_ids_is_rejected() {
        let log = "\
submitted 0
header
average_baseline 13 1 10 20 10
average_baseline 31 1 30 40 10
";
        let err = build(log, &default_gpu()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::RestartedRun { .. })
        ));
    }
}
