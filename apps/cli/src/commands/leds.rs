//! LED 灯带命令

use crate::commands::connection::LinkArgs;
use anyhow::{Context, Result, bail};
use clap::Args;
use fygimbal_driver::LedPixel;
use std::thread;
use std::time::Duration;

/// 解析 RRGGBB 颜色
pub fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let digits = s.trim_start_matches('#');
    let bytes = hex::decode(digits).map_err(|e| format!("invalid color '{}': {}", s, e))?;
    <[u8; 3]>::try_from(bytes.as_slice())
        .map_err(|_| format!("invalid color '{}': expected RRGGBB", s))
}

/// 用纯色填充整条灯带
#[derive(Args, Debug)]
pub struct LedsCommand {
    /// 颜色（RRGGBB）
    #[arg(value_parser = parse_color)]
    pub color: [u8; 3],

    /// 像素数量
    #[arg(short = 'n', long, default_value_t = 200)]
    pub count: usize,

    /// 亮度（0-31）
    #[arg(short, long, default_value_t = LedPixel::MAX_BRIGHTNESS)]
    pub brightness: u8,

    /// 重复发送次数
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// 重复发送间隔（毫秒）
    #[arg(long, default_value_t = 50)]
    pub interval_ms: u64,
}

impl LedsCommand {
    /// 构建一帧像素
    pub fn frame(&self) -> Result<Vec<LedPixel>> {
        if self.brightness > LedPixel::MAX_BRIGHTNESS {
            bail!(
                "亮度 {} 超出范围（最大 {}）",
                self.brightness,
                LedPixel::MAX_BRIGHTNESS
            );
        }
        let [r, g, b] = self.color;
        Ok(vec![LedPixel::new(self.brightness, r, g, b); self.count])
    }

    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let pixels = self.frame()?;
        let port = link.open_passive(Vec::new())?;

        for i in 0..self.repeat.max(1) {
            if i > 0 {
                thread::sleep(Duration::from_millis(self.interval_ms));
            }
            port.send_leds(&pixels).context("发送 LED 帧失败")?;
        }
        println!(
            "💡 {} 个像素 #{} 亮度 {}",
            self.count,
            hex::encode(self.color),
            self.brightness
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(color: [u8; 3], brightness: u8) -> LedsCommand {
        LedsCommand {
            color,
            count: 3,
            brightness,
            repeat: 1,
            interval_ms: 0,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("ff8000"), Ok([0xFF, 0x80, 0x00]));
        assert_eq!(parse_color("#123456"), Ok([0x12, 0x34, 0x56]));
        assert!(parse_color("fff").is_err());
        assert!(parse_color("12345678").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }

    #[test]
    fn test_frame_fills_every_pixel() {
        let pixels = command([1, 2, 3], 7).frame().unwrap();
        assert_eq!(pixels.len(), 3);
        assert!(pixels.iter().all(|p| *p == LedPixel::new(7, 1, 2, 3)));
    }

    #[test]
    fn test_brightness_out_of_range() {
        assert!(command([0, 0, 0], 32).frame().is_err());
    }
}
