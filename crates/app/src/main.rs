//! Entry point for meshview.
//! Flags: --gpu-backend=..., --size=WxH, --width=N, --height=N, then an optional OBJ path.

use std::path::PathBuf;

use anyhow::Result;
use platform::{ViewerConfig, config};

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{other}', falling back to auto.");
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X'))
                && let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>())
            {
                w = Some(pw);
                h = Some(ph);
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=")
            && let Ok(ph) = v.parse::<u32>()
        {
            h = Some(ph);
        }
    }

    (
        w.unwrap_or(config::DEFAULT_WIDTH),
        h.unwrap_or(config::DEFAULT_HEIGHT),
    )
}

/// First argument that is not a `--flag`.
fn parse_mesh_path(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
}

fn parse_config(args: &[String]) -> ViewerConfig {
    let (width, height) = parse_size_args(args);
    let mut cfg = ViewerConfig {
        backends: parse_backend_arg(args),
        ..ViewerConfig::default()
    }
    .with_size(width, height);
    if let Some(path) = parse_mesh_path(args) {
        cfg = cfg.with_mesh_path(path);
    }
    cfg
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = parse_config(&args);
    log::info!(
        "Starting meshview. Backend: {:?}, window_size={}x{}, mesh={:?}",
        cfg.backends,
        cfg.width,
        cfg.height,
        cfg.mesh_path
    );

    platform::run_viewer(cfg)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = parse_config(&[]);
        assert_eq!((cfg.width, cfg.height), (1280, 720));
        assert_eq!(cfg.backends, wgpu::Backends::all());
        assert!(cfg.mesh_path.is_none());
    }

    #[test]
    fn size_flags_and_path() {
        let cfg = parse_config(&args(&[
            "--gpu-backend=Vulkan",
            "--size=800X600",
            "--height=500",
            "models/teapot.obj",
        ]));
        assert_eq!(cfg.backends, wgpu::Backends::VULKAN);
        assert_eq!((cfg.width, cfg.height), (800, 500));
        assert_eq!(cfg.mesh_path, Some(PathBuf::from("models/teapot.obj")));
    }

    #[test]
    fn malformed_size_is_ignored() {
        let cfg = parse_config(&args(&["--size=wide", "--width=0"]));
        assert_eq!((cfg.width, cfg.height), (1, 720));
    }
}
