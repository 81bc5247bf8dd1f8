//! Renders a dialog to PNG panels without touching the display.

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use image::GrayImage;
use log::warn;
use xkcd_core::{
    dialog::{SpokenLine, parse_dialog},
    layout::{Canvas, PanelRenderer, Rasterizer, RenderSettings},
    narrator::normalize,
};
use xkcd_hal_linux::FontRasterizer;

/// Time a viewer gets to open images before the temporary directory goes.
const VIEWER_GRACE: Duration = Duration::from_secs(2);

pub fn render_dialog(
    dialog_file: &Path,
    outdir: Option<&Path>,
    show: bool,
    render: RenderSettings,
) -> Result<()> {
    let raw = fs::read_to_string(dialog_file)
        .with_context(|| format!("failed to read {}", dialog_file.display()))?;
    let lines = parse_dialog(&raw)
        .and_then(|lines| normalize(&lines))
        .with_context(|| format!("invalid dialog {}", dialog_file.display()))?;
    let stem = dialog_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dialog".to_string());

    let renderer = PanelRenderer::new(FontRasterizer::load(&render.font_path)?, render);

    let temporary;
    let (dir, show) = match outdir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("output directory {} does not exist", dir.display());
            }
            (dir.to_path_buf(), show)
        }
        None => {
            temporary = tempfile::tempdir().context("failed to create temporary directory")?;
            (temporary.path().to_path_buf(), true)
        }
    };

    for path in write_panels(&renderer, &lines, &stem, &dir)? {
        println!("{}", path.display());
        if show {
            if let Err(err) = open::that(&path) {
                warn!("cannot open {}: {}", path.display(), err);
            }
        }
    }

    if outdir.is_none() {
        thread::sleep(VIEWER_GRACE);
    }
    Ok(())
}

/// Writes `{stem}-{NN}-{speaker}.png` for every line.
pub fn write_panels<R: Rasterizer>(
    renderer: &PanelRenderer<R>,
    lines: &[SpokenLine],
    stem: &str,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let panel = renderer
            .render(&line.text)
            .with_context(|| format!("panel {} does not fit", index + 1))?;
        let path = dir.join(format!("{stem}-{:02}-{}.png", index + 1, line.speaker));
        save_png(panel.canvas, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn save_png(canvas: Canvas, path: &Path) -> Result<()> {
    let (width, height) = (canvas.width(), canvas.height());
    let image = GrayImage::from_raw(width, height, canvas.into_pixels())
        .ok_or_else(|| anyhow!("canvas buffer does not match {width}x{height}"))?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
