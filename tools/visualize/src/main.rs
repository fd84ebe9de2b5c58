//! Diagnostic visualizer: runs one simulation and writes PNG debug images.
//! Not part of the main pipeline.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crater_core::{CraterSimulator, RasterGrid, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "visualize", about = "Render a simulated cratered surface")]
struct Args {
    /// JSON config; defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "data/debug")]
    out_dir: PathBuf,
}

const PROFILE_W: u32 = 800;
const PROFILE_H: u32 = 300;

// ── Colour helpers ────────────────────────────────────────────────────────────

/// Spectral ramp, low (blue) to high (red).
const RAMP: [[f32; 3]; 6] = [
    [50.0, 80.0, 170.0],
    [60.0, 160.0, 190.0],
    [150.0, 210.0, 160.0],
    [240.0, 230.0, 140.0],
    [240.0, 150.0, 80.0],
    [190.0, 50.0, 50.0],
];

fn spectral(t: f64) -> [f32; 3] {
    let x = t.clamp(0.0, 1.0) as f32 * (RAMP.len() - 1) as f32;
    let i = (x.floor() as usize).min(RAMP.len() - 2);
    let f = x - i as f32;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    [a[0] + (b[0] - a[0]) * f, a[1] + (b[1] - a[1]) * f, a[2] + (b[2] - a[2]) * f]
}

/// Lambertian hillshade in [0, 1], sun from the north-west at 45°.
fn hillshade(grid: &RasterGrid, row: usize, col: usize) -> f64 {
    let n = grid.columns;
    let m = grid.rows;
    let z = |r: usize, c: usize| grid.get(r.min(m - 1), c.min(n - 1));
    let dzdx = (z(row, col + 1) - z(row, col.saturating_sub(1))) / (2.0 * grid.spacing);
    let dzdy = (z(row + 1, col) - z(row.saturating_sub(1), col)) / (2.0 * grid.spacing);

    let (azimuth, altitude) = (315f64.to_radians(), 45f64.to_radians());
    let slope = dzdx.hypot(dzdy).atan();
    let aspect = dzdy.atan2(-dzdx);
    let shade = altitude.sin() * slope.cos() + altitude.cos() * slope.sin() * (azimuth - aspect).cos();
    shade.clamp(0.0, 1.0)
}

fn render_hillshade(grid: &RasterGrid) -> image::RgbImage {
    let (lo, hi) = (grid.min_elevation(), grid.max_elevation());
    let range = (hi - lo).max(f64::EPSILON);
    let mut img = image::RgbImage::new(grid.columns as u32, grid.rows as u32);
    for r in 0..grid.rows {
        for c in 0..grid.columns {
            let colour = spectral((grid.get(r, c) - lo) / range);
            let light = 0.35 + 0.65 * hillshade(grid, r, c) as f32;
            let px = colour.map(|v| (v * light).clamp(0.0, 255.0) as u8);
            // Image rows run top-down; grid rows run south to north.
            img.put_pixel(c as u32, (grid.rows - 1 - r) as u32, image::Rgb(px));
        }
    }
    img
}

fn render_profile(profile: &[f64]) -> image::RgbImage {
    let mut img = image::RgbImage::from_pixel(PROFILE_W, PROFILE_H, image::Rgb([255, 255, 255]));
    if profile.len() < 2 {
        return img;
    }
    let lo = profile.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = (hi - lo).max(f64::EPSILON);
    let margin = 10.0;
    let to_y = |z: f64| margin + (1.0 - (z - lo) / range) * (PROFILE_H as f64 - 2.0 * margin);

    // One sample per pixel column, joined vertically to the previous one.
    let mut prev: Option<u32> = None;
    for px in 0..PROFILE_W {
        let t = px as f64 / (PROFILE_W - 1) as f64 * (profile.len() - 1) as f64;
        let i = (t.floor() as usize).min(profile.len() - 2);
        let z = profile[i] + (profile[i + 1] - profile[i]) * (t - i as f64);
        let y = (to_y(z).round() as u32).min(PROFILE_H - 1);
        let (a, b) = match prev {
            Some(p) => (p.min(y), p.max(y)),
            None => (y, y),
        };
        for yy in a..=b {
            img.put_pixel(px, yy, image::Rgb([40, 40, 40]));
        }
        prev = Some(y);
    }
    img
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SimulationConfig::from_json_str(&text)?
        }
        None => SimulationConfig::default(),
    };

    println!("Running simulation (seed {})…", config.seed);
    let result = CraterSimulator::new().run(&config)?;
    println!(
        "{} craters, elevation {:.1} to {:.1} m",
        result.summary.craters, result.summary.min_elevation, result.summary.max_elevation
    );

    fs::create_dir_all(&args.out_dir).with_context(|| format!("creating {}", args.out_dir.display()))?;

    // ── 1. hillshade.png ─────────────────────────────────────────────────────
    let path = args.out_dir.join("hillshade.png");
    render_hillshade(&result.grid).save(&path).with_context(|| format!("saving {}", path.display()))?;
    println!("Wrote {}", path.display());

    // ── 2. profile.png ───────────────────────────────────────────────────────
    let path = args.out_dir.join("profile.png");
    render_profile(result.grid.row_profile(result.grid.rows / 2))
        .save(&path)
        .with_context(|| format!("saving {}", path.display()))?;
    println!("Wrote {}", path.display());

    println!("Done.");
    Ok(())
}
