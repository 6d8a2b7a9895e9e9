//! Which stages are charged for a GPU.

use crate::config::resources::ResourceRow;
use anyhow::Context;
use std::collections::BTreeSet;

/// GPU stage policy, supplied on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuStages {
    /// 0-based resource table positions that use a GPU.
    Rows(BTreeSet<usize>),
    /// A row uses a GPU when its Gres count is non-zero.
    FromGres,
}

impl GpuStages {
    /// Parse a comma separated list of row positions, e.g. "4,8".
    pub fn parse_rows(list: &str) -> anyhow::Result<Self> {
        let mut rows = BTreeSet::new();
        for part in list.split(',') {
            let p = part.trim();
            if p.is_empty() {
                continue;
            }
            rows.insert(
                p.parse::<usize>()
                    .with_context(|| format!("bad GPU stage index {:?}", p))?,
            );
        }
        Ok(Self::Rows(rows))
    }

    /// 1 if the row is a GPU stage, else 0.
    pub fn gpus_for(&self, row: &ResourceRow) -> u32 {
        let gpu = match self {
            Self::Rows(rows) => rows.contains(&row.index),
            Self::FromGres => gres_count(&row.gres) > 0,
        };
        u32::from(gpu)
    }
}

/// Trailing count of a Gres spec: "1" -> 1, "gpu:2" -> 2, "gpu:v100:1" -> 1.
fn gres_count(gres: &str) -> u32 {
    gres.rsplit(':')
        .next()
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::script::StageScript;
    use pretty_assertions::assert_eq;

    fn row(index: usize, gres: &str) -> ResourceRow {
        ResourceRow {
            index,
            stage: StageScript::parse(&format!("run_{:02}_stage", index + 1)).unwrap(),
            time: "1:00:00".to_string(),
            nodes: 1,
            ntasks: 1,
            ncpus_per_task: 1,
            gres: gres.to_string(),
            mem_per_cpu: "1G".to_string(),
        }
    }

    #[test]
    fn default_rows_flag_positions_four_and_eight() {
        let policy = GpuStages::parse_rows("4,8").unwrap();
        let flagged: Vec<usize> = (0..12)
            .filter(|&i| policy.gpus_for(&row(i, "0")) == 1)
            .collect();
        assert_eq!(flagged, vec![4, 8]);
    }

    #[test]
    fn empty_list_flags_nothing() {
        let policy = GpuStages::parse_rows("").unwrap();
        assert_eq!(policy, GpuStages::Rows(BTreeSet::new()));
        assert_eq!(policy.gpus_for(&row(4, "1")), 0);
    }

    #[test]
    fn bad_index_is_an_error() {
        assert!(GpuStages::parse_rows("4,x").is_err());
    }

    #[test]
    fn gres_policy_reads_counts() {
        let policy = GpuStages::FromGres;
        assert_eq!(policy.gpus_for(&row(0, "0")), 0);
        assert_eq!(policy.gpus_for(&row(0, "1")), 1);
        assert_eq!(policy.gpus_for(&row(0, "gpu:2")), 1);
        assert_eq!(policy.gpus_for(&row(0, "none")), 0);
    }
}
