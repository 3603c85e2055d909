use anyhow::Result;
use serde::Serialize;

use crate::repair::{GapKind, GapOutcome};

/// 某一类缺口的处理结果计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GapCounts {
    pub repaired: usize,
    pub too_long: usize,
    pub no_path: usize,
    pub over_budget: usize,
    pub above_error_rate: usize,
    pub no_candidate: usize,
    pub inconsistent: usize,
}

impl GapCounts {
    pub fn record(&mut self, outcome: GapOutcome) {
        let slot = match outcome {
            GapOutcome::Repaired => &mut self.repaired,
            GapOutcome::TooLong => &mut self.too_long,
            GapOutcome::NoPath => &mut self.no_path,
            GapOutcome::OverBudget => &mut self.over_budget,
            GapOutcome::AboveErrorRate => &mut self.above_error_rate,
            GapOutcome::NoCandidate => &mut self.no_candidate,
            GapOutcome::Inconsistent => &mut self.inconsistent,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.repaired
            + self.too_long
            + self.no_path
            + self.over_budget
            + self.above_error_rate
            + self.no_candidate
            + self.inconsistent
    }
}

/// 整个运行期间累积的修复统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairStats {
    pub records_read: usize,
    pub records_skipped: usize,
    pub records_corrected: usize,
    pub corrections: usize,
    pub bases_in: usize,
    pub bases_out: usize,
    pub leading: GapCounts,
    pub interior: GapCounts,
    pub trailing: GapCounts,
}

impl RepairStats {
    pub fn record_gap(&mut self, kind: GapKind, outcome: GapOutcome) {
        match kind {
            GapKind::Leading => self.leading.record(outcome),
            GapKind::Interior => self.interior.record(outcome),
            GapKind::Trailing => self.trailing.record(outcome),
        }
    }
}

/// `--report` 写出的 JSON 运行报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub command_line: String,
    pub sequences: String,
    pub kmer_counts: String,
    pub kmer_len: usize,
    pub prefix_len: usize,
    pub count_lines: usize,
    pub count_lines_skipped: usize,
    pub kmers_loaded: usize,
    pub kmers_used: usize,
    pub max_gap: usize,
    pub max_paths: usize,
    pub stats: RepairStats,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_file(&self, path: &str) -> Result<()> {
        let fh = std::fs::File::create(path)
            .map_err(|e| anyhow::anyhow!("cannot create report '{}': {}", path, e))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(fh), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_counts_by_kind() {
        let mut stats = RepairStats::default();
        stats.record_gap(GapKind::Interior, GapOutcome::Repaired);
        stats.record_gap(GapKind::Interior, GapOutcome::OverBudget);
        stats.record_gap(GapKind::Trailing, GapOutcome::AboveErrorRate);
        assert_eq!(stats.interior.repaired, 1);
        assert_eq!(stats.interior.over_budget, 1);
        assert_eq!(stats.interior.total(), 2);
        assert_eq!(stats.trailing.above_error_rate, 1);
        assert_eq!(stats.leading.total(), 0);
    }

    #[test]
    fn report_serializes_to_json() {
        let mut stats = RepairStats { records_read: 2, corrections: 1, ..Default::default() };
        stats.record_gap(GapKind::Leading, GapOutcome::NoPath);
        let report = RunReport {
            started_at: "2026-01-01T00:00:00+00:00".to_string(),
            command_line: "kmer-repair repair reads.fa counts.txt".to_string(),
            sequences: "reads.fa".to_string(),
            kmer_counts: "counts.txt".to_string(),
            kmer_len: 21,
            prefix_len: 10,
            count_lines: 100,
            count_lines_skipped: 0,
            kmers_loaded: 100,
            kmers_used: 12,
            max_gap: 500,
            max_paths: 500,
            stats,
        };
        let json = report.to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["kmer_len"], 21);
        assert_eq!(v["stats"]["records_read"], 2);
        assert_eq!(v["stats"]["leading"]["no_path"], 1);
        assert_eq!(v["stats"]["interior"]["repaired"], 0);
    }
}
