//! 標準エラー出力へのログ
//!
//! 進捗表示は標準出力（println!）、警告・デバッグ情報はこちら。

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!(
            "[{}] {:<5} {}",
            Local::now().format("%H:%M:%S"),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// ロガーを登録（2回目以降はレベルの変更のみ）
pub fn init(verbose: bool) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level_for(verbose));
}

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}
