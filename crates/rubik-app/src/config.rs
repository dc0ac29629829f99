// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rubik_core::LogConfig;
use rubik_platform::WindowConfig;
use rubik_render::LoopOptions;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file; a missing file means defaults
    #[arg(long, value_name = "FILE", default_value = "rubik.toml")]
    pub config: PathBuf,
    /// Force the validation layer on
    #[arg(long, conflicts_with = "no_validation")]
    pub validation: bool,
    /// Force the validation layer off
    #[arg(long)]
    pub no_validation: bool,
    /// Stop after N frames
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,
    /// Load SPIR-V from this directory instead of the embedded copies
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WindowCfg {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        let w = WindowConfig::default();
        Self {
            title: w.title,
            width: w.width,
            height: w.height,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsCfg {
    pub enabled: bool,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ShaderCfg {
    pub dir: PathBuf,
    pub vertex: String,
    pub fragment: String,
    /// Only honored when built with `embed-shaders`.
    pub embedded: bool,
}

impl Default for ShaderCfg {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("shaders"),
            vertex: "triangle.vert.spv".to_owned(),
            fragment: "triangle.frag.spv".to_owned(),
            embedded: cfg!(feature = "embed-shaders"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct FrameLoopCfg {
    pub max_frames: Option<u64>,
    pub log_fps: bool,
}

impl Default for FrameLoopCfg {
    fn default() -> Self {
        Self {
            max_frames: None,
            log_fps: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogCfg {
    pub filter: String,
}

impl Default for LogCfg {
    fn default() -> Self {
        Self {
            filter: LogConfig::default().default_filter,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppCfg {
    pub window: WindowCfg,
    pub diagnostics: DiagnosticsCfg,
    pub shaders: ShaderCfg,
    pub frame_loop: FrameLoopCfg,
    pub log: LogCfg,
}

impl AppCfg {
    pub fn parse(text: &str) -> Result<Self> {
        let cfg: AppCfg = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            bail!(
                "window size must be non-zero, got {}x{}",
                self.window.width,
                self.window.height
            );
        }
        Ok(())
    }

    /// Command-line flags win over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if args.validation {
            self.diagnostics.enabled = true;
        }
        if args.no_validation {
            self.diagnostics.enabled = false;
        }
        if let Some(n) = args.frames {
            self.frame_loop.max_frames = Some(n);
        }
        if let Some(dir) = &args.shader_dir {
            self.shaders.dir = dir.clone();
            self.shaders.embedded = false;
        }
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            default_filter: self.log.filter.clone(),
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            max_frames: self.frame_loop.max_frames,
            log_fps: self.frame_loop.log_fps,
        }
    }
}

/// Missing file means defaults; anything unreadable or malformed is an error.
pub fn load_cfg(path: &Path) -> Result<AppCfg> {
    match fs::read_to_string(path) {
        Ok(s) => AppCfg::parse(&s).with_context(|| format!("invalid config {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppCfg::default()),
        Err(e) => Err(e).with_context(|| format!("reading config {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["rubik"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = AppCfg::parse("").unwrap();
        assert_eq!(cfg, AppCfg::default());
        assert_eq!(cfg.window.title, "Rubik Rescue");
        assert_eq!((cfg.window.width, cfg.window.height), (1080, 720));
        assert_eq!(cfg.shaders.vertex, "triangle.vert.spv");
        assert_eq!(cfg.shaders.fragment, "triangle.frag.spv");
        assert_eq!(cfg.log.filter, "info");
        assert!(cfg.frame_loop.log_fps);
        assert_eq!(cfg.frame_loop.max_frames, None);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = AppCfg::parse(
            r#"
            [window]
            title = "smoke"

            [frame_loop]
            max_frames = 120

            [diagnostics]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.window.title, "smoke");
        assert_eq!(cfg.window.width, 1080);
        assert_eq!(cfg.frame_loop.max_frames, Some(120));
        assert!(cfg.frame_loop.log_fps);
        assert!(cfg.diagnostics.enabled);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppCfg::parse("[window\nwidth = ").is_err());
        assert!(AppCfg::parse("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let err = AppCfg::parse("[window]\nheight = 0").unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("rubik-no-such-config.toml");
        let _ = fs::remove_file(&path);
        assert_eq!(load_cfg(&path).unwrap(), AppCfg::default());
    }

    #[test]
    fn file_on_disk_is_parsed() {
        let path = std::env::temp_dir().join(format!("rubik-cfg-{}.toml", std::process::id()));
        fs::write(&path, "[log]\nfilter = \"debug\"\n").unwrap();
        let cfg = load_cfg(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(cfg.log_config().default_filter, "debug");
    }

    #[test]
    fn flags_override_file() {
        let mut cfg = AppCfg::parse("[diagnostics]\nenabled = true\n[shaders]\nembedded = true").unwrap();
        cfg.apply_args(&args(&["--no-validation", "--frames", "3", "--shader-dir", "out/spv"]));
        assert!(!cfg.diagnostics.enabled);
        assert_eq!(cfg.loop_options().max_frames, Some(3));
        assert_eq!(cfg.shaders.dir, PathBuf::from("out/spv"));
        assert!(!cfg.shaders.embedded);

        let mut cfg = AppCfg::default();
        cfg.apply_args(&args(&["--validation"]));
        assert!(cfg.diagnostics.enabled);
    }

    #[test]
    fn validation_flags_conflict() {
        assert!(Args::try_parse_from(["rubik", "--validation", "--no-validation"]).is_err());
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let mut cfg = AppCfg::default();
        cfg.apply_args(&args(&[]));
        assert_eq!(cfg, AppCfg::default());
        assert_eq!(args(&[]).config, PathBuf::from("rubik.toml"));
    }
}
