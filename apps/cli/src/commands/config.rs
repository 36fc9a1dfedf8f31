//! 配置管理命令
//!
//! 配置文件为 TOML 格式，内容即 `GimbalConfig`，缺省字段使用默认值。

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use fygimbal_driver::GimbalConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径（`<config_dir>/fygimbal/config.toml`）
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("fygimbal");
    path.push("config.toml");
    Ok(path)
}

/// 加载配置
///
/// - 显式指定的文件必须存在
/// - 默认路径下没有文件时返回默认配置
pub fn load_config(explicit: Option<&Path>) -> Result<GimbalConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_file()?;
            if !path.exists() {
                return Ok(GimbalConfig::default());
            }
            path
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<GimbalConfig> {
    Ok(toml::from_str(content)?)
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示配置文件路径
    Path,

    /// 显示生效的配置（TOML）
    Show,

    /// 写入默认配置文件
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Path => {
                let path = match explicit {
                    Some(path) => path.to_path_buf(),
                    None => default_config_file()?,
                };
                println!("{}", path.display());
                Ok(())
            },

            ConfigCommand::Show => {
                let config = load_config(explicit)?;
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            },

            ConfigCommand::Init { force } => {
                let path = match explicit {
                    Some(path) => path.to_path_buf(),
                    None => default_config_file()?,
                };
                write_default(&path, *force)?;
                println!("✅ 已写入默认配置: {}", path.display());
                Ok(())
            },
        }
    }
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("创建配置目录失败")?;
    }
    let content = format!(
        "# Flyer gimbal link configuration\n\n{}",
        toml::to_string_pretty(&GimbalConfig::default())?
    );
    fs::write(path, content).context("写入配置文件失败")?;
    Ok(())
}
