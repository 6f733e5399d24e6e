use crate::update::SummaryTarget;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "budgetinator")]
#[command(about = "EUプロジェクト予算ワークブックの集計シート更新ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// パートナーシートの値を集計シートに転記し、書式を設定
    Update {
        /// ワークブック（.xlsx）
        #[arg(required = true)]
        workbook: PathBuf,

        /// 出力ファイル（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 集計シート (budget/pm/all)
        #[arg(short, long)]
        summary: Option<SummaryTarget>,

        /// 指定したパートナー番号のみ更新（2-20）
        #[arg(short, long)]
        partner: Option<u32>,

        /// 数式をコピーし、参照を集計行に付け替える
        #[arg(long)]
        formulas: bool,

        /// 書式設定を行わない
        #[arg(long)]
        no_format: bool,

        /// カスタム対応表（JSON）
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// 結果をJSONで保存
        #[arg(long)]
        report: Option<PathBuf>,

        /// バックアップを作成しない
        #[arg(long)]
        no_backup: bool,

        /// 上書き確認をスキップ
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 集計行の書式のみ設定（転記なし）
    Format {
        /// ワークブック（.xlsx）
        #[arg(required = true)]
        workbook: PathBuf,

        /// 出力ファイル（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 集計シート (budget/pm/all)
        #[arg(short, long)]
        summary: Option<SummaryTarget>,

        /// 指定したパートナー番号の行のみ
        #[arg(short, long)]
        partner: Option<u32>,

        /// 書式を解除
        #[arg(long)]
        clear: bool,

        /// 上書き確認をスキップ
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 検出されたパートナーシートと集計行を表示
    Partners {
        /// ワークブック（.xlsx）
        #[arg(required = true)]
        workbook: PathBuf,

        /// 集計シート (budget/pm/all)
        #[arg(short, long)]
        summary: Option<SummaryTarget>,
    },

    /// フォルダ内のワークブックを一括更新
    Batch {
        /// ワークブックのフォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 集計シート (budget/pm/all)
        #[arg(short, long)]
        summary: Option<SummaryTarget>,

        /// 数式をコピーし、参照を集計行に付け替える
        #[arg(long)]
        formulas: bool,

        /// 書式設定を行わない
        #[arg(long)]
        no_format: bool,

        /// 結果をJSONで保存
        #[arg(long)]
        report: Option<PathBuf>,

        /// バックアップを作成しない
        #[arg(long)]
        no_backup: bool,

        /// 上書き確認をスキップ
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 数式コピーの既定値 (true/false)
        #[arg(long)]
        set_formulas: Option<bool>,

        /// 書式設定の既定値 (true/false)
        #[arg(long)]
        set_formatting: Option<bool>,

        /// 保存前バックアップの既定値 (true/false)
        #[arg(long)]
        set_backup: Option<bool>,

        /// 既定の集計シート (budget/pm/all)
        #[arg(long)]
        set_summary: Option<SummaryTarget>,

        /// カスタム対応表（JSON）を登録
        #[arg(long)]
        set_mapping: Option<PathBuf>,

        /// カスタム対応表の登録を解除
        #[arg(long)]
        clear_mapping: bool,

        /// 対応表を登録/解除する集計シート (budget/pm)
        #[arg(long, default_value = "budget")]
        mapping_target: SummaryTarget,
    },
}
