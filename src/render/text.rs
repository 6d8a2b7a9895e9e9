use crate::duration::format_duration;
use crate::model::{ReportData, StageSummary};
use chrono::DateTime;

const BANNER: &str = "#####################################################";

const HEADERS: [&str; 11] = [
    "Step",
    "Num jobs",
    "Start",
    "Finish",
    "Total elapsed",
    "Queue time",
    "Array mean",
    "Array std",
    "CPUs",
    "GPUs",
    "Cost ($)",
];

/// Render the summary banner followed by the per-stage table.
pub fn render_text_report(data: &ReportData) -> String {
    let t = &data.totals;
    let mut out = String::new();

    out.push_str(BANNER);
    out.push('\n');
    out.push_str("# Summary timings\n");
    out.push_str(&format!(
        "# Job submitted at:    {} (UTC)\n",
        fmt_time(t.submitted)
    ));
    out.push_str(&format!(
        "# Total time:          {}\n",
        format_duration(t.total_time as f64, 0)
    ));
    out.push_str(&format!(
        "# Total run time:      {}\n",
        format_duration(t.total_run_time as f64, 0)
    ));
    out.push_str(&format!(
        "# Total queue time:    {}\n",
        format_duration(t.total_queue_time as f64, 0)
    ));
    out.push_str(&format!("# Estimated cost:      ${:.2}\n", t.total_cost));
    out.push_str(BANNER);
    out.push_str("\n\n");

    out.push_str(&render_stage_table(&data.stages));
    out
}

fn stage_cells(s: &StageSummary) -> [String; 11] {
    [
        s.step.clone(),
        s.num_jobs.to_string(),
        fmt_time(s.start),
        fmt_time(s.finish),
        format_duration(s.total_elapsed as f64, 0),
        format_duration(s.queue_time as f64, 0),
        format_duration(s.array_mean, 0),
        // Single-task stages have no deviation.
        match s.array_std {
            Some(std) => format_duration(std, 0),
            None => "0".to_string(),
        },
        s.cpus.to_string(),
        s.gpus.to_string(),
        format!("{:.4}", s.cost),
    ]
}

/// Fixed-width table: step column left aligned, the rest right aligned.
fn render_stage_table(stages: &[StageSummary]) -> String {
    let rows: Vec<[String; 11]> = stages.iter().map(stage_cells).collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let fmt_row = |cells: &[&str]| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = fmt_row(&HEADERS[..]);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&fmt_row(&cells));
    }
    out
}

fn fmt_time(unix: i64) -> String {
    match DateTime::from_timestamp(unix, 0) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => unix.to_string(),
    }
}
