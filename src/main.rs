mod app;
mod renderer;
mod settings;
mod viewer;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use solar_viz::config::VizConfig;
use solar_viz::generators::{self, TextureAtlas};
use solar_viz::texture::Raster;

/// Procedural solar system viewer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML file overriding the built-in settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for every procedural texture.
    #[arg(long)]
    seed: Option<u64>,
    /// Equirectangular texture size, e.g. `2048x1024`.
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,
    /// Write every generated texture as PNG into this directory and exit.
    #[arg(long, value_name = "DIR")]
    export_textures: Option<PathBuf>,
    /// Restrict the export to these texture keys (repeatable), e.g. `earth`.
    #[arg(long = "texture", value_name = "KEY", requires = "export_textures")]
    textures: Vec<String>,
}

fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

fn load_config(args: &Args) -> color_eyre::Result<VizConfig> {
    let mut config = match &args.config {
        Some(path) => VizConfig::from_toml_file(path).wrap_err_with(|| format!("loading {}", path.display()))?,
        None => VizConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.textures.seed = seed;
    }
    if let Some((width, height)) = args.resolution {
        config.textures.width = width;
        config.textures.height = height;
    }
    config.validate()?;
    Ok(config)
}

fn export_textures(config: &VizConfig, dir: &std::path::Path, only: &[String]) -> color_eyre::Result<()> {
    let spec = config.texture_spec()?;
    // Unknown keys fail before anything is written.
    let rasters: Vec<(String, Raster)> = if only.is_empty() {
        TextureAtlas::generate(spec)
            .iter()
            .map(|(key, raster)| (key.to_string(), Raster::clone(raster)))
            .collect()
    } else {
        only.iter()
            .map(|name| Ok((name.clone(), generators::generate_named(name, &spec)?)))
            .collect::<Result<_, solar_viz::error::ConfigurationError>>()?
    };

    std::fs::create_dir_all(dir).wrap_err_with(|| format!("creating {}", dir.display()))?;
    for (name, raster) in rasters {
        let path = dir.join(format!("{name}.png"));
        raster.save_png(&path).wrap_err_with(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "exported");
    }
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(dir) = &args.export_textures {
        return export_textures(&config, dir, &args.textures);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1600.0, 1000.0])
            .with_title("Solar System"),
        ..Default::default()
    };
    eframe::run_native(
        "Solar System",
        options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, &config)))),
    )
    .map_err(|e| color_eyre::eyre::eyre!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_both_separators() {
        assert_eq!(parse_resolution("2048x1024"), Ok((2048, 1024)));
        assert_eq!(parse_resolution("512X256"), Ok((512, 256)));
        assert!(parse_resolution("512").is_err());
        assert!(parse_resolution("ax256").is_err());
    }

    #[test]
    fn cli_overrides_apply_on_top_of_defaults() {
        let args = Args::parse_from(["solar-viz", "--seed", "42", "--resolution", "1024x512"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.textures.seed, 42);
        assert_eq!((config.textures.width, config.textures.height), (1024, 512));
    }

    #[test]
    fn undersized_resolution_is_rejected() {
        let args = Args::parse_from(["solar-viz", "--resolution", "64x32"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn export_rejects_unknown_texture_keys_before_writing() {
        let dir = std::env::temp_dir().join(format!("solar-viz-export-{}", std::process::id()));
        let config = VizConfig::default();
        let err = export_textures(&config, &dir, &["earth".into(), "pluto".into()]).unwrap_err();
        assert!(err.to_string().contains("pluto"));
        assert!(!dir.exists());
    }

    #[test]
    fn texture_filter_requires_an_export_dir() {
        assert!(Args::try_parse_from(["solar-viz", "--texture", "earth"]).is_err());
        let args = Args::try_parse_from(["solar-viz", "--export-textures", "out", "--texture", "earth", "--texture", "ring"]).unwrap();
        assert_eq!(args.textures, ["earth", "ring"]);
    }

    #[test]
    fn oversized_resolution_is_rejected_before_allocation() {
        let args = Args::parse_from(["solar-viz", "--resolution", "65536x65536"]);
        assert!(load_config(&args).is_err());
    }
}
