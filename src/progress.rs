//! 更新処理の進捗表示（indicatif）

use budgetinator_common::{PartnerSheet, TranscriptionReport, UpdateObserver, UpdatePhase};
use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressObserver {
    bar: ProgressBar,
    phase: UpdatePhase,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self {
            bar,
            phase: UpdatePhase::Idle,
        }
    }

    /// 表示しない（テスト・一括処理用）
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            phase: UpdatePhase::Idle,
        }
    }

    pub fn phase(&self) -> &UpdatePhase {
        &self.phase
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateObserver for ProgressObserver {
    fn on_phase(&mut self, phase: &UpdatePhase) {
        self.phase = phase.clone();
        match phase {
            UpdatePhase::Formatting => self.bar.set_message("書式設定中..."),
            UpdatePhase::Completed(_) | UpdatePhase::Failed(_) => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    fn on_partner_start(&mut self, partner: &PartnerSheet, index: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64);
        self.bar.set_message(partner.sheet_name.clone());
    }

    fn on_partner_done(&mut self, _report: &TranscriptionReport) {
        self.bar.inc(1);
    }
}
