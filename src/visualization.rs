use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::{JudgerError, Result};
use crate::evaluation::{LearningCurvePoint, RocCurve};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const MARGIN: u32 = 60;
const GRID_DIVISIONS: usize = 10;

fn rgb(c: colorous::Color) -> Rgb<u8> {
    Rgb([c.r, c.g, c.b])
}

fn train_color() -> Rgb<u8> {
    rgb(colorous::SET1[0])
}

fn validation_color() -> Rgb<u8> {
    rgb(colorous::SET1[1])
}

/// A white canvas with a data window mapped inside fixed margins.
struct Plot {
    img: RgbImage,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Plot {
    fn new(x_range: (f64, f64), y_range: (f64, f64)) -> Plot {
        let mut plot = Plot {
            img: RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255])),
            x_range,
            y_range,
        };
        let grid = Rgb([220, 220, 220]);
        for k in 0..=GRID_DIVISIONS {
            let t = k as f64 / GRID_DIVISIONS as f64;
            let x = x_range.0 + t * (x_range.1 - x_range.0);
            let y = y_range.0 + t * (y_range.1 - y_range.0);
            plot.line((x, y_range.0), (x, y_range.1), grid, 1, false);
            plot.line((x_range.0, y), (x_range.1, y), grid, 1, false);
        }
        let axis = Rgb([0, 0, 0]);
        plot.line((x_range.0, y_range.0), (x_range.1, y_range.0), axis, 1, false);
        plot.line((x_range.0, y_range.0), (x_range.0, y_range.1), axis, 1, false);
        plot.line((x_range.1, y_range.0), (x_range.1, y_range.1), axis, 1, false);
        plot.line((x_range.0, y_range.1), (x_range.1, y_range.1), axis, 1, false);
        plot
    }

    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let w = (WIDTH - 2 * MARGIN) as f64;
        let h = (HEIGHT - 2 * MARGIN) as f64;
        let px = MARGIN as f64 + (x - self.x_range.0) / (self.x_range.1 - self.x_range.0) * w;
        let py = (HEIGHT - MARGIN) as f64 - (y - self.y_range.0) / (self.y_range.1 - self.y_range.0) * h;
        (px, py)
    }

    fn blend(&mut self, px: i64, py: i64, color: Rgb<u8>, alpha: f64) {
        if px < 0 || py < 0 || px >= WIDTH as i64 || py >= HEIGHT as i64 {
            return;
        }
        let p = self.img.get_pixel_mut(px as u32, py as u32);
        for c in 0..3 {
            p.0[c] = (p.0[c] as f64 * (1.0 - alpha) + color.0[c] as f64 * alpha).round() as u8;
        }
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>, thickness: i64, dashed: bool) {
        let (x0, y0) = self.to_pixel(from.0, from.1);
        let (x1, y1) = self.to_pixel(to.0, to.1);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize + 1;
        for s in 0..=steps {
            if dashed && (s / 8) % 2 == 1 {
                continue;
            }
            let t = s as f64 / steps as f64;
            let px = (x0 + t * (x1 - x0)).round() as i64;
            let py = (y0 + t * (y1 - y0)).round() as i64;
            for dx in 0..thickness {
                for dy in 0..thickness {
                    self.blend(px + dx, py + dy, color, 1.0);
                }
            }
        }
    }

    fn polyline(&mut self, xs: &[f64], ys: &[f64], color: Rgb<u8>) {
        for (x, y) in xs.windows(2).zip(ys.windows(2)) {
            self.line((x[0], y[0]), (x[1], y[1]), color, 2, false);
        }
    }

    fn markers(&mut self, xs: &[f64], ys: &[f64], color: Rgb<u8>) {
        const RADIUS: i64 = 4;
        for (&x, &y) in xs.iter().zip(ys) {
            let (cx, cy) = self.to_pixel(x, y);
            let (cx, cy) = (cx.round() as i64, cy.round() as i64);
            for dx in -RADIUS..=RADIUS {
                for dy in -RADIUS..=RADIUS {
                    if dx * dx + dy * dy <= RADIUS * RADIUS {
                        self.blend(cx + dx, cy + dy, color, 1.0);
                    }
                }
            }
        }
    }

    /// Translucent fill between `lower` and `upper`, linear between samples.
    fn band(&mut self, xs: &[f64], lower: &[f64], upper: &[f64], color: Rgb<u8>, alpha: f64) {
        for k in 0..xs.len().saturating_sub(1) {
            let (x0, lo0) = self.to_pixel(xs[k], lower[k]);
            let (x1, lo1) = self.to_pixel(xs[k + 1], lower[k + 1]);
            let (_, hi0) = self.to_pixel(xs[k], upper[k]);
            let (_, hi1) = self.to_pixel(xs[k + 1], upper[k + 1]);
            let (start, end) = (x0.round() as i64, x1.round() as i64);
            // the shared column belongs to the next segment
            for px in start..end.max(start + 1) {
                let t = if end > start {
                    (px - start) as f64 / (end - start) as f64
                } else {
                    0.0
                };
                let lo = lo0 + t * (lo1 - lo0);
                let hi = hi0 + t * (hi1 - hi0);
                for py in hi.min(lo).round() as i64..=hi.max(lo).round() as i64 {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    /// Short thick swatches stacked in the top right corner, one per series.
    fn legend(&mut self, colors: &[Rgb<u8>]) {
        let right = (WIDTH - MARGIN) as i64 - 20;
        for (k, color) in colors.iter().enumerate() {
            let y = (MARGIN + 20) as i64 + 20 * k as i64;
            for px in right - 40..right {
                for dy in -1..=1 {
                    self.blend(px, y + dy, *color, 1.0);
                }
            }
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.img
            .save(path)
            .map_err(|e| JudgerError::io(path.display().to_string(), std::io::Error::other(e)))
    }
}

/// Mean training and validation score against training size, with +/- 1 std bands.
///
/// Legend, top right: training score first, cross-validation score second.
pub fn render_learning_curve(output_path: &Path, points: &[LearningCurvePoint]) -> Result<()> {
    let xs: Vec<f64> = points.iter().map(|p| p.train_size as f64).collect();
    let x_max = xs.iter().cloned().fold(1.0, f64::max) * 1.05;
    let lowest = points
        .iter()
        .map(|p| (p.train_mean - p.train_std).min(p.validation_mean - p.validation_std))
        .fold(0.8, f64::min);
    let y_min = ((lowest * 20.0).floor() / 20.0).max(0.0);
    let mut plot = Plot::new((0.0, x_max), (y_min, 1.05));

    let bands = [
        (
            points.iter().map(|p| p.train_mean).collect::<Vec<_>>(),
            points.iter().map(|p| p.train_std).collect::<Vec<_>>(),
            train_color(),
        ),
        (
            points.iter().map(|p| p.validation_mean).collect(),
            points.iter().map(|p| p.validation_std).collect(),
            validation_color(),
        ),
    ];
    for (mean, std, color) in &bands {
        let lower: Vec<f64> = mean.iter().zip(std).map(|(m, s)| m - s).collect();
        let upper: Vec<f64> = mean.iter().zip(std).map(|(m, s)| m + s).collect();
        plot.band(&xs, &lower, &upper, *color, 0.1);
    }
    for (mean, _, color) in &bands {
        plot.polyline(&xs, mean, *color);
        plot.markers(&xs, mean, *color);
    }
    plot.legend(&[train_color(), validation_color()]);
    plot.save(output_path)?;
    log::info!(
        "learning curve (x: training examples, y: accuracy; red: training score, blue: cross-validation score) written to {}",
        output_path.display()
    );
    Ok(())
}

/// ROC curve over the unit square with the chance diagonal dashed.
///
/// Legend, top right: the ROC curve first, the chance diagonal second.
pub fn render_roc_curve(output_path: &Path, roc: &RocCurve) -> Result<()> {
    let mut plot = Plot::new((0.0, 1.0), (0.0, 1.05));
    plot.line((0.0, 0.0), (1.0, 1.0), validation_color(), 2, true);
    plot.polyline(&roc.fpr, &roc.tpr, train_color());
    plot.legend(&[train_color(), validation_color()]);
    plot.save(output_path)?;
    log::info!(
        "ROC curve (area = {:.2}; x: false positive rate, y: true positive rate) written to {}",
        roc.auc,
        output_path.display()
    );
    Ok(())
}
