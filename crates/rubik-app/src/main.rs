// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rubik_core::{init_tracing, LogConfig};
use rubik_platform::Platform;
use rubik_render::{DirShaderSource, FrameLoop, LoopSummary, ShaderSource};
use rubik_render_vk::{Diagnostics, ShaderNames, VkRenderer};
use tracing::{error, info, warn};

use config::{load_cfg, Args, ShaderCfg};

#[cfg(feature = "embed-shaders")]
fn embedded_shaders() -> Option<Box<dyn ShaderSource>> {
    Some(Box::new(rubik_render_vk::EmbeddedShaders))
}

#[cfg(not(feature = "embed-shaders"))]
fn embedded_shaders() -> Option<Box<dyn ShaderSource>> {
    None
}

fn shader_source(cfg: &ShaderCfg) -> Box<dyn ShaderSource> {
    if cfg.embedded {
        if let Some(src) = embedded_shaders() {
            info!("using embedded shaders");
            return src;
        }
        warn!("embedded shaders requested but not built in; reading from disk");
    }
    info!("loading shaders from {}", cfg.dir.display());
    Box::new(DirShaderSource::new(cfg.dir.clone()))
}

fn run(args: Args) -> Result<LoopSummary> {
    let mut cfg = load_cfg(&args.config)?;
    cfg.apply_args(&args);
    init_tracing(&cfg.log_config());
    info!(
        "starting (config {}, validation={})",
        args.config.display(),
        cfg.diagnostics.enabled
    );

    // Declared before the renderer so the window outlives the surface.
    let mut platform = Platform::new(cfg.window_config()).context("window init")?;
    let size = platform.drawable_size()?;
    let shaders = shader_source(&cfg.shaders);

    let mut renderer = {
        let window = platform.window()?;
        VkRenderer::new(
            window,
            window,
            size,
            Diagnostics {
                enabled: cfg.diagnostics.enabled,
            },
            shaders.as_ref(),
            ShaderNames {
                vertex: &cfg.shaders.vertex,
                fragment: &cfg.shaders.fragment,
            },
        )
        .map_err(|e| {
            let kind = e.kind();
            anyhow::Error::new(e).context(format!("vulkan init failed ({kind})"))
        })?
    };

    let mut frame_loop = FrameLoop::new(cfg.loop_options());
    let summary = frame_loop
        .run(&mut renderer, &mut platform)
        .map_err(|e| {
            let kind = e.kind();
            anyhow::Error::new(e).context(format!(
                "frame {} failed at {:?} ({kind})",
                frame_loop.frames(),
                frame_loop.stage()
            ))
        })?;

    info!(
        "exiting after {} frames in {:.2?}",
        summary.frames, summary.elapsed
    );
    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            // No-op when run() already installed the subscriber.
            init_tracing(&LogConfig::default());
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::AppCfg;

    #[test]
    fn embedded_default_follows_feature() {
        assert_eq!(
            AppCfg::default().shaders.embedded,
            cfg!(feature = "embed-shaders")
        );
    }

    #[cfg(feature = "embed-shaders")]
    #[test]
    fn default_config_loads_both_stages() {
        let cfg = AppCfg::default();
        let src = shader_source(&cfg.shaders);
        for name in [&cfg.shaders.vertex, &cfg.shaders.fragment] {
            let bytes = src.load_bytes(name).unwrap();
            assert!(!bytes.is_empty());
            assert_eq!(bytes.len() % 4, 0);
        }
    }

    #[test]
    fn shader_dir_flag_reads_from_disk() {
        let mut cfg = AppCfg::default();
        cfg.apply_args(&Args::try_parse_from(["rubik", "--shader-dir", "no/such/dir"]).unwrap());
        let err = shader_source(&cfg.shaders)
            .load_bytes(&cfg.shaders.vertex)
            .unwrap_err();
        assert!(matches!(err, rubik_render::ShaderError::FileNotFound { .. }));
    }
}
