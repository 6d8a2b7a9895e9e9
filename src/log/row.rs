/// A single array-task row from the timings log.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    pub step: String,
    pub job_id: u64,
    pub array_id: u64,
    /// Unix seconds.
    pub start: i64,
    /// Unix seconds.
    pub finish: i64,
    pub elapsed: f64,
}

/// Parsed timings log: submission time plus rows in file order.
#[derive(Debug, Clone)]
pub struct TimingLog {
    /// Submission time, Unix seconds.
    pub submitted: i64,
    pub records: Vec<TimingRecord>,
}

