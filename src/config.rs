use crate::error::{BudgetinatorError, Result};
use budgetinator_common::{StylePalette, SummaryKind, TranscribeMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 数式をコピーする（false: 計算結果のみ）
    pub copy_formulas: bool,
    pub apply_formatting: bool,
    pub backup_before_save: bool,
    /// 集計シートの指定がない場合の対象（None: 両方）
    pub default_summary: Option<SummaryKind>,
    /// Budget Overview 用のカスタム対応表
    pub budget_mapping: Option<PathBuf>,
    /// PM Overview 用のカスタム対応表
    pub pm_mapping: Option<PathBuf>,
    pub palette: StylePalette,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み（存在しなければデフォルト）
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BudgetinatorError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home
            .join(".config")
            .join("project-budgetinator")
            .join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            copy_formulas: false,
            apply_formatting: true,
            backup_before_save: true,
            default_summary: None,
            budget_mapping: None,
            pm_mapping: None,
            palette: StylePalette::default(),
        }
    }

    pub fn transcribe_mode(&self) -> TranscribeMode {
        if self.copy_formulas {
            TranscribeMode::PreserveFormulas
        } else {
            TranscribeMode::Values
        }
    }

    /// 集計シートごとのカスタム対応表
    pub fn mapping_for(&self, kind: SummaryKind) -> Option<&Path> {
        match kind {
            SummaryKind::BudgetOverview => self.budget_mapping.as_deref(),
            SummaryKind::PmOverview => self.pm_mapping.as_deref(),
        }
    }

    pub fn set_mapping(&mut self, kind: SummaryKind, path: Option<PathBuf>) -> Result<()> {
        if let Some(p) = &path {
            if !p.exists() {
                return Err(BudgetinatorError::FileNotFound(p.display().to_string()));
            }
        }
        match kind {
            SummaryKind::BudgetOverview => self.budget_mapping = path,
            SummaryKind::PmOverview => self.pm_mapping = path,
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.apply_formatting);
        assert_eq!(config.transcribe_mode(), TranscribeMode::Values);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            copy_formulas: true,
            default_summary: Some(SummaryKind::PmOverview),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.transcribe_mode(), TranscribeMode::PreserveFormulas);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backup_before_save": false}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.backup_before_save);
        assert!(config.apply_formatting);
        assert_eq!(config.palette, StylePalette::default());
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(BudgetinatorError::JsonParse(_))
        ));
    }
}
