//! Legend images for the probability color gradient.
//!
//! The PNG is a plain raster of the gradient strip and its tick marks. The SVG carries the
//! same strip as a linear gradient plus tick labels and the caption.

use super::config::{ColorbarConfig, ImageFormat, Orientation};
use super::error::EngineError;
use super::report::artifact_path;
use crate::core::color::gradient::Gradient;
use std::path::{Path, PathBuf};
use svg::Document;
use svg::node::element::{Definitions, Line, LinearGradient, Rectangle, Stop, Text};
use tracing::debug;

pub const TICKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
const TICK_LABELS: [&str; 5] = ["0.0", "0.25", "0.5", "0.75", "1.0"];

const PNG_DPI: f64 = 300.0;
const POINTS_PER_INCH: f64 = 72.0;

pub fn caption(gradient: &Gradient) -> String {
    format!(
        "Base-Pairing Probability (Pi) - Colormap: {}",
        gradient.name()
    )
}

/// Where the strip sits inside the canvas, in canvas units.
#[derive(Debug, Clone, Copy)]
struct Layout {
    width: f64,
    height: f64,
    strip_x: f64,
    strip_y: f64,
    strip_w: f64,
    strip_h: f64,
    tick_len: f64,
    orientation: Orientation,
}

impl Layout {
    fn new(config: &ColorbarConfig, units_per_inch: f64) -> Self {
        let (width, height) = match config.orientation {
            Orientation::Horizontal => (config.width, config.height),
            Orientation::Vertical => (config.height, config.width),
        };
        let (width, height) = (width * units_per_inch, height * units_per_inch);
        match config.orientation {
            Orientation::Horizontal => Self {
                width,
                height,
                strip_x: width * 0.05,
                strip_y: height * 0.1,
                strip_w: width * 0.9,
                strip_h: height * 0.35,
                tick_len: height * 0.08,
                orientation: config.orientation,
            },
            Orientation::Vertical => Self {
                width,
                height,
                strip_x: width * 0.1,
                strip_y: height * 0.05,
                strip_w: width * 0.3,
                strip_h: height * 0.9,
                tick_len: width * 0.08,
                orientation: config.orientation,
            },
        }
    }

    /// Gradient value at a point inside the strip; vertical strips grow upwards.
    fn value_at(&self, x: f64, y: f64) -> f64 {
        match self.orientation {
            Orientation::Horizontal => (x - self.strip_x) / self.strip_w,
            Orientation::Vertical => 1.0 - (y - self.strip_y) / self.strip_h,
        }
    }

    /// Start and end points of the tick mark for `value`.
    fn tick(&self, value: f64) -> ((f64, f64), (f64, f64)) {
        match self.orientation {
            Orientation::Horizontal => {
                let x = self.strip_x + value * self.strip_w;
                let y = self.strip_y + self.strip_h;
                ((x, y), (x, y + self.tick_len))
            }
            Orientation::Vertical => {
                let x = self.strip_x + self.strip_w;
                let y = self.strip_y + (1.0 - value) * self.strip_h;
                ((x, y), (x + self.tick_len, y))
            }
        }
    }
}

pub fn colorbar_path(dir: &Path, sequence: &str, gradient: &Gradient, format: ImageFormat) -> PathBuf {
    artifact_path(
        dir,
        sequence,
        &format!("base_pairing_probability_colorbar_{}", gradient.name()),
        format.extension(),
    )
}

/// Writes one legend per configured format and returns the written paths.
pub fn write_colorbars(
    dir: &Path,
    sequence: &str,
    gradient: &Gradient,
    config: &ColorbarConfig,
) -> Result<Vec<PathBuf>, EngineError> {
    let mut written = Vec::with_capacity(config.formats.len());
    for &format in &config.formats {
        let path = colorbar_path(dir, sequence, gradient, format);
        match format {
            ImageFormat::Png => write_png(&path, gradient, config)?,
            ImageFormat::Svg => write_svg(&path, gradient, config)?,
        }
        debug!(path = %path.display(), "Color bar written");
        written.push(path);
    }
    Ok(written)
}

fn write_png(path: &Path, gradient: &Gradient, config: &ColorbarConfig) -> Result<(), EngineError> {
    let layout = Layout::new(config, PNG_DPI);
    let (width, height) = (layout.width.round() as u32, layout.height.round() as u32);
    if width == 0 || height == 0 {
        return Err(EngineError::Colorbar(format!(
            "image would be {}x{} pixels",
            width, height
        )));
    }
    let mut img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));

    let x0 = layout.strip_x.round() as u32;
    let y0 = layout.strip_y.round() as u32;
    let x1 = ((layout.strip_x + layout.strip_w).round() as u32).min(width);
    let y1 = ((layout.strip_y + layout.strip_h).round() as u32).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            let color = gradient.sample(layout.value_at(x as f64 + 0.5, y as f64 + 0.5));
            img.put_pixel(x, y, image::Rgb([color.r, color.g, color.b]));
        }
    }

    let shade = (255.0 * (1.0 - config.transparency)).round() as u8;
    let half = (config.line_width * PNG_DPI / POINTS_PER_INCH / 2.0).max(0.5);
    for value in TICKS {
        let ((ax, ay), (bx, by)) = layout.tick(value);
        let (left, right) = (ax.min(bx) - half, ax.max(bx) + half);
        let (top, bottom) = (ay.min(by) - half, ay.max(by) + half);
        let clamp_x = |v: f64| v.clamp(0.0, width as f64) as u32;
        let clamp_y = |v: f64| v.clamp(0.0, height as f64) as u32;
        for y in clamp_y(top)..clamp_y(bottom) {
            for x in clamp_x(left)..clamp_x(right) {
                img.put_pixel(x, y, image::Rgb([shade, shade, shade]));
            }
        }
    }

    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| EngineError::Colorbar(format!("{}: {}", path.display(), e)))
}

fn svg_document(gradient: &Gradient, config: &ColorbarConfig) -> Document {
    let layout = Layout::new(config, POINTS_PER_INCH);
    let stops = gradient.stops();
    let last = (stops.len() - 1).max(1) as f64;

    let (x2, y1) = match layout.orientation {
        Orientation::Horizontal => ("1", "0"),
        Orientation::Vertical => ("0", "1"),
    };
    let mut fill = LinearGradient::new()
        .set("id", "probability")
        .set("x1", "0")
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", "0");
    for (index, stop) in stops.iter().enumerate() {
        fill = fill.add(
            Stop::new()
                .set("offset", format!("{:.4}", index as f64 / last))
                .set("stop-color", stop.to_hex()),
        );
    }

    let mut doc = Document::new()
        .set("viewBox", (0.0, 0.0, layout.width, layout.height))
        .set("width", format!("{}pt", layout.width))
        .set("height", format!("{}pt", layout.height))
        .add(Definitions::new().add(fill))
        .add(
            Rectangle::new()
                .set("x", layout.strip_x)
                .set("y", layout.strip_y)
                .set("width", layout.strip_w)
                .set("height", layout.strip_h)
                .set("fill", "url(#probability)")
                .set("stroke", "#000000")
                .set("stroke-width", 0.5),
        );

    for (value, label) in TICKS.iter().zip(TICK_LABELS) {
        let ((ax, ay), (bx, by)) = layout.tick(*value);
        let (tx, ty, anchor) = match layout.orientation {
            Orientation::Horizontal => (bx, by + config.font_size, "middle"),
            Orientation::Vertical => (bx + config.font_size * 0.3, by + config.font_size * 0.35, "start"),
        };
        doc = doc
            .add(
                Line::new()
                    .set("x1", ax)
                    .set("y1", ay)
                    .set("x2", bx)
                    .set("y2", by)
                    .set("stroke", "#000000")
                    .set("stroke-width", config.line_width)
                    .set("stroke-opacity", config.transparency),
            )
            .add(
                Text::new(label)
                    .set("x", tx)
                    .set("y", ty)
                    .set("font-family", "sans-serif")
                    .set("font-size", config.font_size)
                    .set("text-anchor", anchor),
            );
    }

    let caption_text = Text::new(caption(gradient))
        .set("font-family", "sans-serif")
        .set("font-size", config.font_size)
        .set("text-anchor", "middle");
    let caption_text = match layout.orientation {
        Orientation::Horizontal => caption_text
            .set("x", layout.width / 2.0)
            .set("y", layout.height - config.font_size * 0.5),
        Orientation::Vertical => {
            let x = layout.width - config.font_size;
            let y = layout.height / 2.0;
            caption_text
                .set("x", x)
                .set("y", y)
                .set("transform", format!("rotate(90 {} {})", x, y))
        }
    };
    doc.add(caption_text)
}

fn write_svg(path: &Path, gradient: &Gradient, config: &ColorbarConfig) -> Result<(), EngineError> {
    svg::save(path, &svg_document(gradient, config)).map_err(|e| EngineError::io(path, e))
}
