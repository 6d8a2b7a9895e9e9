use crate::error::ToolError;
use crate::log::row::{TimingLog, TimingRecord};
use anyhow::{Context, bail};
use regex::Regex;
use std::fs;

/// Parse a timings log file written by the generated sbatch scripts.
///
/// Layout:
/// line 1: free text ending in the submission time (Unix seconds)
/// line 2: column header (ignored)
/// rest:   step  job_id  array_id  start_unix  finish_unix  elapsed_seconds
///
/// Example:
/// Submission time: 1623456000
/// Step  JobID  ArrayID  Start  Finish  Elapsed
/// unpack_topo_reference   1234   1   1623456100   1623456400   300
pub fn parse_timing_file(path: &str) -> anyhow::Result<TimingLog> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read timing log file {}", path))?;
    let log = parse_timing_text(&text, path)?;
    tracing::info!(path, records = log.records.len(), "parsed timing log");
    Ok(log)
}

pub(crate) fn parse_timing_text(text: &str, path: &str) -> anyhow::Result<TimingLog> {
    let submitted_re = Regex::new(r#"(\d+)\s*$"#)?;
    // Capture: step, job id, array id, start, finish, elapsed.
    let row_re = Regex::new(
        r#"^\s*(\S+)\s+(\d+)\s+(\d+)\s+(-?\d+)\s+(-?\d+)\s+([0-9]+(?:\.[0-9]+)?)\s*$"#,
    )?;

    let mut lines = text.lines();

    let first = match lines.next() {
        Some(l) => l,
        None => bail!("timing log {} is empty", path),
    };
    let submitted: i64 = match submitted_re.captures(first) {
        Some(caps) => caps[1]
            .parse()
            .with_context(|| format!("bad submission time at {}:1: {:?}", path, first))?,
        None => bail!(
            "timing log parse error at {}:1: no submission timestamp in {:?}",
            path,
            first
        ),
    };

    // Line 2 is the column header.
    lines.next();

    let mut records = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let lno = lineno + 3;
        let line = line.trim_end();

        if line.trim().is_empty() {
            continue;
        }

        let caps = match row_re.captures(line) {
            Some(c) => c,
            None => {
                bail!(
                    "timing log parse error at {}:{}: cannot parse line: {:?}",
                    path,
                    lno,
                    line
                );
            }
        };

        records.push(TimingRecord {
            step: caps[1].to_string(),
            job_id: caps[2]
                .parse()
                .with_context(|| format!("bad job id at {}:{}", path, lno))?,
            array_id: caps[3]
                .parse()
                .with_context(|| format!("bad array id at {}:{}", path, lno))?,
            start: caps[4]
                .parse()
                .with_context(|| format!("bad start time at {}:{}", path, lno))?,
            finish: caps[5]
                .parse()
                .with_context(|| format!("bad finish time at {}:{}", path, lno))?,
            elapsed: caps[6]
                .parse()
                .with_context(|| format!("bad elapsed time at {}:{}", path, lno))?,
        });
    }

    if records.is_empty() {
        return Err(ToolError::EmptyTimingLog {
            path: path.to_string(),
        }
        .into());
    }

    Ok(TimingLog { submitted, records })
}
