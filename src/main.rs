use clap::Parser;
use dialoguer::Confirm;
use project_budgetinator::{cli, config, error, excel, logging, progress, report, scanner, update};
use budgetinator_common::{SummaryKind, TranscribeMode};
use cli::{Cli, Commands};
use config::Config;
use error::{BudgetinatorError, Result};
use std::path::{Path, PathBuf};
use update::{Action, SummaryTarget, UpdateJob};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Update {
            workbook,
            output,
            summary,
            partner,
            formulas,
            no_format,
            mapping,
            report: report_path,
            no_backup,
            yes,
        } => {
            println!("📊 budgetinator - 集計シート更新\n");

            let mut job = UpdateJob::new(summary, mapping.as_deref(), &config)?;
            job.options.partner = partner;
            if formulas {
                job.options.mode = TranscribeMode::PreserveFormulas;
            }
            if no_format {
                job.options.skip_formatting = true;
            }
            if no_backup {
                job.backup = false;
            }

            let output = output.unwrap_or_else(|| workbook.clone());
            confirm_overwrite(&workbook, &output, yes)?;

            println!(
                "- 集計シートを更新中...{}",
                if job.options.mode == TranscribeMode::PreserveFormulas { " (数式コピー)" } else { "" }
            );
            let mut observer = progress::ProgressObserver::new();
            let result = update::process_file(&workbook, &output, &job, Action::Update, &mut observer);
            observer.finish();
            let file_report = result?;
            report::print_file_report(&file_report);
            println!("✔ 保存: {}", output.display());

            if let Some(path) = report_path {
                report::write_json_report(&path, &file_report)?;
                println!("✔ レポート: {}", path.display());
            }

            println!("\n✅ 更新完了");
        }

        Commands::Format {
            workbook,
            output,
            summary,
            partner,
            clear,
            yes,
        } => {
            println!("🎨 budgetinator - 書式設定\n");

            let mut job = UpdateJob::new(summary, None, &config)?;
            job.options.partner = partner;

            let output = output.unwrap_or_else(|| workbook.clone());
            confirm_overwrite(&workbook, &output, yes)?;

            let action = if clear { Action::ClearFormat } else { Action::Format };
            println!("{}", if clear { "- 書式を解除中..." } else { "- 書式を設定中..." });
            let file_report = update::process_file(
                &workbook,
                &output,
                &job,
                action,
                &mut budgetinator_common::NoopObserver,
            )?;
            report::print_file_report(&file_report);
            println!("✔ 保存: {}", output.display());

            println!("\n✅ 完了");
        }

        Commands::Partners { workbook, summary } => {
            let job = UpdateJob::new(summary, None, &config)?;
            let book = excel::load_workbook(&workbook)?;

            for (table, partners) in update::list_partners(&book, &job)? {
                println!("{} ({}件):", table.summary_sheet, partners.len());
                for p in partners {
                    println!("  P{:<3} {:<30} → 行{}", p.number, p.sheet_name, table.target_row(p.number));
                }
            }
        }

        Commands::Batch {
            folder,
            recursive,
            summary,
            formulas,
            no_format,
            report: report_path,
            no_backup,
            yes,
        } => {
            println!("🚀 budgetinator - 一括更新\n");

            let mut job = UpdateJob::new(summary, None, &config)?;
            if formulas {
                job.options.mode = TranscribeMode::PreserveFormulas;
            }
            if no_format {
                job.options.skip_formatting = true;
            }
            if no_backup {
                job.backup = false;
            }

            // 1. スキャン
            println!("[1/2] ワークブックをスキャン中...");
            let files = scanner::scan_folder(&folder, recursive)?;
            println!("✔ {}件のワークブックを検出\n", files.len());

            if files.is_empty() {
                return Err(BudgetinatorError::NoWorkbooksFound(folder.display().to_string()));
            }
            if !yes {
                let proceed = Confirm::new()
                    .with_prompt(format!("{}件のワークブックを上書きします。続行しますか?", files.len()))
                    .default(false)
                    .interact()?;
                if !proceed {
                    return Err(BudgetinatorError::Cancelled);
                }
            }

            // 2. 更新（1件の失敗で全体を止めない）
            println!("[2/2] 更新中...");
            let mut batch = report::BatchReport::default();
            for (i, file) in files.iter().enumerate() {
                println!("[{}/{}] {}", i + 1, files.len(), file.file_name);
                let mut observer = progress::ProgressObserver::hidden();
                match update::process_file(&file.path, &file.path, &job, Action::Update, &mut observer) {
                    Ok(file_report) => {
                        report::print_file_report(&file_report);
                        batch.files.push(file_report);
                    }
                    Err(e) => {
                        println!("  ✗ {}", e);
                        batch.failures.push(report::BatchFailure {
                            file: file.path.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            let updated: usize = batch.files.iter().map(|f| f.partners_updated()).sum();
            println!(
                "\n成功: {}件 / 失敗: {}件（パートナー行 {}件を更新）",
                batch.files.len(),
                batch.failures.len(),
                updated
            );

            if let Some(path) = report_path {
                report::write_json_report(&path, &batch)?;
                println!("✔ レポート: {}", path.display());
            }

            println!("\n✅ 一括更新完了");
        }

        Commands::Config {
            show,
            set_formulas,
            set_formatting,
            set_backup,
            set_summary,
            set_mapping,
            clear_mapping,
            mapping_target,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(v) = set_formulas {
                config.copy_formulas = v;
                changed = true;
            }
            if let Some(v) = set_formatting {
                config.apply_formatting = v;
                changed = true;
            }
            if let Some(v) = set_backup {
                config.backup_before_save = v;
                changed = true;
            }
            if let Some(target) = set_summary {
                config.default_summary = single_kind(target);
                changed = true;
            }

            if set_mapping.is_some() || clear_mapping {
                let kind = single_kind(mapping_target).ok_or_else(|| {
                    BudgetinatorError::Config("--mapping-target は budget または pm を指定してください".into())
                })?;
                let path = if clear_mapping { None } else { set_mapping.map(absolute) };
                if let Some(p) = &path {
                    update::load_table(kind, Some(p))?;
                }
                config.set_mapping(kind, path)?;
                println!("✔ 対応表を設定しました ({})", kind);
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                print_config(&config)?;
            }
        }
    }

    Ok(())
}

/// 上書き保存の確認（-y で省略）
fn confirm_overwrite(input: &Path, output: &Path, yes: bool) -> Result<()> {
    if !input.exists() {
        return Err(BudgetinatorError::FileNotFound(input.display().to_string()));
    }
    if yes || !update::same_file(input, output) {
        return Ok(());
    }

    let proceed = Confirm::new()
        .with_prompt(format!("{} を上書きします。続行しますか?", input.display()))
        .default(false)
        .interact()?;
    if proceed {
        Ok(())
    } else {
        Err(BudgetinatorError::Cancelled)
    }
}

fn single_kind(target: SummaryTarget) -> Option<SummaryKind> {
    match target.kinds() {
        [kind] => Some(*kind),
        _ => None,
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}

fn print_config(config: &Config) -> Result<()> {
    let on_off = |b: bool| if b { "有効" } else { "無効" };

    println!("設定 ({}):", Config::config_path()?.display());
    println!("  数式コピー: {}", on_off(config.copy_formulas));
    println!("  書式設定: {}", on_off(config.apply_formatting));
    println!("  保存前バックアップ: {}", on_off(config.backup_before_save));
    println!(
        "  既定の集計シート: {}",
        config
            .default_summary
            .map(|k| k.to_string())
            .unwrap_or_else(|| "すべて".into())
    );
    for kind in SummaryKind::ALL {
        println!(
            "  対応表 ({}): {}",
            kind,
            config
                .mapping_for(kind)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "組み込み".into())
        );
    }
    Ok(())
}
