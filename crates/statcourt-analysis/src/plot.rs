//! Supporting plots for test results.
//!
//! Adapters describe what to draw as a [`Plot`] and hand it to a
//! [`PlotRenderer`]. [`BitmapRenderer`] draws PNG files with [`plotters`].

use std::{fs, io, path::Path};

use plotters::{
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use statcourt_stats::{contingency::ContingencyTable, quartiles::Quartiles};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PlotError {
    #[display("failed to create plot directory")]
    #[from]
    Io(io::Error),
    #[display("nothing to plot: {reason}")]
    EmptyData { reason: String },
    #[display("failed to prepare drawing area: {reason}")]
    DrawingArea { reason: String },
    #[display("failed to configure chart: {reason}")]
    ChartConfig { reason: String },
    #[display("failed to draw chart elements: {reason}")]
    Drawing { reason: String },
}

impl PlotError {
    fn drawing_area(err: &impl ToString) -> Self {
        Self::DrawingArea {
            reason: err.to_string(),
        }
    }

    fn chart_config(err: &impl ToString) -> Self {
        Self::ChartConfig {
            reason: err.to_string(),
        }
    }

    fn drawing(err: &impl ToString) -> Self {
        Self::Drawing {
            reason: err.to_string(),
        }
    }
}

/// A chart to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Plot {
    /// Annotated heatmap of contingency counts. Rows run down the y axis.
    Heatmap {
        title: String,
        x_label: String,
        y_label: String,
        table: ContingencyTable,
    },
    /// One box per group.
    BoxPlot {
        title: String,
        x_label: String,
        y_label: String,
        groups: Vec<(String, Vec<f64>)>,
    },
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
}

impl Plot {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Plot::Heatmap { title, .. } | Plot::BoxPlot { title, .. } | Plot::Scatter { title, .. } => {
                title
            }
        }
    }

    /// Checks that there is something finite to draw.
    pub fn ensure_drawable(&self) -> Result<(), PlotError> {
        let reason = match self {
            Plot::Heatmap { table, .. } if table.is_empty() => "contingency table is empty",
            Plot::BoxPlot { groups, .. }
                if padded_range(groups.iter().flat_map(|(_, v)| v.iter().copied())).is_none() =>
            {
                "box plot groups are empty"
            }
            Plot::Scatter { points, .. }
                if padded_range(points.iter().flat_map(|&(x, y)| [x, y])).is_none() =>
            {
                "scatter plot has no points"
            }
            _ => return Ok(()),
        };
        Err(PlotError::EmptyData {
            reason: reason.to_owned(),
        })
    }
}

/// Renders a [`Plot`] to an image file.
pub trait PlotRenderer {
    fn render(&self, plot: &Plot, path: &Path) -> Result<(), PlotError>;
}

impl<R> PlotRenderer for &R
where
    R: PlotRenderer + ?Sized,
{
    fn render(&self, plot: &Plot, path: &Path) -> Result<(), PlotError> {
        (**self).render(plot, path)
    }
}

/// Draws PNG images with the plotters bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct BitmapRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for BitmapRenderer {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

const FONT: &str = "sans-serif";
const BOX_HALF_WIDTH: f64 = 0.3;

impl PlotRenderer for BitmapRenderer {
    /// Nothing is left at `path` when rendering fails.
    fn render(&self, plot: &Plot, path: &Path) -> Result<(), PlotError> {
        plot.ensure_drawable()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let result = self.draw(plot, path);
        if result.is_err() {
            // the backend writes whatever was drawn when it is dropped
            let _ = fs::remove_file(path);
        }
        result
    }
}

impl BitmapRenderer {
    fn draw(&self, plot: &Plot, path: &Path) -> Result<(), PlotError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| PlotError::drawing_area(&e))?;

        match plot {
            Plot::Heatmap {
                title,
                x_label,
                y_label,
                table,
            } => draw_heatmap(&root, title, x_label, y_label, table)?,
            Plot::BoxPlot {
                title,
                x_label,
                y_label,
                groups,
            } => draw_box_plot(&root, title, x_label, y_label, groups)?,
            Plot::Scatter {
                title,
                x_label,
                y_label,
                points,
            } => draw_scatter(&root, title, x_label, y_label, points)?,
        }

        root.present().map_err(|e| PlotError::drawing(&e))?;
        Ok(())
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// Label of the category centered on integer coordinate `value`, if any.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn category_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Sequential blue ramp from near-white (0) to dark blue (1).
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blue_ramp(intensity: f64) -> RGBColor {
    let t = intensity.clamp(0.0, 1.0);
    let mix = |light: u8, dark: u8| (f64::from(light) + (f64::from(dark) - f64::from(light)) * t).round() as u8;
    RGBColor(mix(247, 8), mix(251, 48), mix(255, 107))
}

fn padded_range<I>(values: I) -> Option<std::ops::Range<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some(min - pad..max + pad)
}

#[expect(clippy::cast_precision_loss)]
fn draw_heatmap(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    table: &ContingencyTable,
) -> Result<(), PlotError> {
    if table.is_empty() {
        return Err(PlotError::EmptyData {
            reason: "contingency table is empty".to_owned(),
        });
    }
    let (rows, cols) = table.shape();
    // row 0 is drawn at the top
    let row_labels = table.row_labels().iter().rev().cloned().collect::<Vec<_>>();
    let col_labels = table.col_labels().to_vec();

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5..cols as f64 - 0.5, -0.5..rows as f64 - 0.5)
        .map_err(|e| PlotError::chart_config(&e))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_desc(x_label)
        .y_desc(y_label)
        .x_label_formatter(&|x| category_label(&col_labels, *x))
        .y_label_formatter(&|y| category_label(&row_labels, *y))
        .label_style((FONT, 16))
        .draw()
        .map_err(|e| PlotError::drawing(&e))?;

    let max = table.max_count().max(1) as f64;
    let cells = table
        .counts()
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, &count)| (c as f64, (rows - 1 - r) as f64, count))
        })
        .collect::<Vec<_>>();

    chart
        .draw_series(cells.iter().map(|&(x, y, count)| {
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                blue_ramp(count as f64 / max).filled(),
            )
        }))
        .map_err(|e| PlotError::drawing(&e))?;

    chart
        .draw_series(cells.iter().map(|&(x, y, count)| {
            let color = if count as f64 / max > 0.5 { WHITE } else { BLACK };
            let style = (FONT, 20)
                .into_font()
                .color(&color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            Text::new(count.to_string(), (x, y), style)
        }))
        .map_err(|e| PlotError::drawing(&e))?;

    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn draw_box_plot(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    groups: &[(String, Vec<f64>)],
) -> Result<(), PlotError> {
    let y_range = padded_range(groups.iter().flat_map(|(_, values)| values.iter().copied()))
        .ok_or_else(|| PlotError::EmptyData {
            reason: "box plot groups are empty".to_owned(),
        })?;
    let labels = groups.iter().map(|(label, _)| label.clone()).collect::<Vec<_>>();

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..groups.len() as f64 - 0.5, y_range)
        .map_err(|e| PlotError::chart_config(&e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len())
        .x_desc(x_label)
        .y_desc(y_label)
        .x_label_formatter(&|x| category_label(&labels, *x))
        .label_style((FONT, 16))
        .draw()
        .map_err(|e| PlotError::drawing(&e))?;

    for (i, (_, values)) in groups.iter().enumerate() {
        let Some(q) = Quartiles::new(values.iter().copied()) else {
            continue;
        };
        let x = i as f64;
        let (left, right) = (x - BOX_HALF_WIDTH, x + BOX_HALF_WIDTH);
        let cap = BOX_HALF_WIDTH / 2.0;

        chart
            .draw_series([
                Rectangle::new([(left, q.q1), (right, q.q3)], blue_ramp(0.3).filled()),
                Rectangle::new([(left, q.q1), (right, q.q3)], BLACK.stroke_width(1)),
            ])
            .map_err(|e| PlotError::drawing(&e))?;

        chart
            .draw_series(
                [
                    vec![(left, q.median), (right, q.median)],
                    vec![(x, q.q1), (x, q.lower_whisker)],
                    vec![(x, q.q3), (x, q.upper_whisker)],
                    vec![(x - cap, q.lower_whisker), (x + cap, q.lower_whisker)],
                    vec![(x - cap, q.upper_whisker), (x + cap, q.upper_whisker)],
                ]
                .into_iter()
                .map(|line| PathElement::new(line, BLACK.stroke_width(2))),
            )
            .map_err(|e| PlotError::drawing(&e))?;

        chart
            .draw_series(
                values
                    .iter()
                    .filter(|v| **v < q.lower_whisker || **v > q.upper_whisker)
                    .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
            )
            .map_err(|e| PlotError::drawing(&e))?;
    }

    Ok(())
}

fn draw_scatter(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
) -> Result<(), PlotError> {
    let empty = || PlotError::EmptyData {
        reason: "scatter plot has no points".to_owned(),
    };
    let x_range = padded_range(points.iter().map(|(x, _)| *x)).ok_or_else(empty)?;
    let y_range = padded_range(points.iter().map(|(_, y)| *y)).ok_or_else(empty)?;

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| PlotError::chart_config(&e))?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .label_style((FONT, 16))
        .draw()
        .map_err(|e| PlotError::drawing(&e))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 4, blue_ramp(0.8).mix(0.7).filled())),
        )
        .map_err(|e| PlotError::drawing(&e))?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, path::PathBuf};

    use super::*;

    /// Records every plot and writes a placeholder file instead of drawing.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRenderer {
        pub(crate) rendered: RefCell<Vec<(String, PathBuf)>>,
    }

    impl PlotRenderer for RecordingRenderer {
        fn render(&self, plot: &Plot, path: &Path) -> Result<(), PlotError> {
            plot.ensure_drawable()?;
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, plot.title())?;
            self.rendered
                .borrow_mut()
                .push((plot.title().to_owned(), path.to_owned()));
            Ok(())
        }
    }

    #[test]
    fn test_category_label() {
        let labels = ["a".to_owned(), "b".to_owned()];
        assert_eq!(category_label(&labels, 0.0), "a");
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_blue_ramp_endpoints() {
        assert_eq!(blue_ramp(0.0), RGBColor(247, 251, 255));
        assert_eq!(blue_ramp(1.0), RGBColor(8, 48, 107));
        assert_eq!(blue_ramp(2.0), RGBColor(8, 48, 107));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0]), Some(-0.5..10.5));
        assert_eq!(padded_range([3.0]), Some(2.0..4.0));
        assert_eq!(padded_range([]), None);
    }

    fn render_all(renderer: &impl PlotRenderer, dir: &Path) -> Vec<PathBuf> {
        let table = ContingencyTable::from_pairs([
            ("X", "a"),
            ("X", "b"),
            ("Y", "a"),
            ("Y", "a"),
            ("Y", "b"),
        ]);
        let plots = [
            Plot::Heatmap {
                title: "city vs segment".to_owned(),
                x_label: "segment".to_owned(),
                y_label: "city".to_owned(),
                table,
            },
            Plot::BoxPlot {
                title: "Boxplot of sales by city".to_owned(),
                x_label: "city".to_owned(),
                y_label: "sales".to_owned(),
                groups: vec![
                    ("X".to_owned(), vec![10.0, 11.0, 9.5, 10.5, 30.0]),
                    ("Y".to_owned(), vec![20.0, 22.0, 19.0, 21.0]),
                ],
            },
            Plot::Scatter {
                title: "sales vs visits (Pearson Correlation)".to_owned(),
                x_label: "sales".to_owned(),
                y_label: "visits".to_owned(),
                points: vec![(1.0, 2.0), (2.0, 4.0), (3.0, 5.0), (4.0, 1.0)],
            },
        ];
        plots
            .iter()
            .enumerate()
            .map(|(i, plot)| {
                let path = dir.join(format!("plots/plot_{i}.png"));
                renderer.render(plot, &path).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_bitmap_renderer_draws_every_plot() {
        let dir = tempfile::tempdir().unwrap();
        for path in render_all(&BitmapRenderer::default(), dir.path()) {
            let bytes = fs::read(&path).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{} is not a PNG", path.display());
        }
    }

    #[test]
    fn test_empty_box_plot_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots/box.png");
        let plot = Plot::BoxPlot {
            title: "t".to_owned(),
            x_label: "x".to_owned(),
            y_label: "y".to_owned(),
            groups: vec![("a".to_owned(), Vec::new()), ("b".to_owned(), Vec::new())],
        };
        let err = BitmapRenderer::default().render(&plot, &path).unwrap_err();
        assert!(matches!(err, PlotError::EmptyData { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_scatter_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let plot = Plot::Scatter {
            title: "t".to_owned(),
            x_label: "x".to_owned(),
            y_label: "y".to_owned(),
            points: Vec::new(),
        };
        let err = BitmapRenderer::default()
            .render(&plot, &dir.path().join("plots/empty.png"))
            .unwrap_err();
        assert!(matches!(err, PlotError::EmptyData { .. }));
        assert!(!dir.path().join("plots").exists());
    }
}
