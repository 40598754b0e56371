//! Module for visualizing price history, purchase points and strategy runs.
//!
//! The chart is a close-price line with one marker series per overlaid
//! backtest result (plus its average-cost line), and an optional volume pane.
//! Styling is carried entirely by [`DrawOptions`] passed into the drawing —
//! there is no process-wide theme state.

use crate::engine::{BacktestResult, PriceSeries};
use crate::errors::{Error, Result};

use chrono::{Duration, NaiveDate};
use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::WHITE;

/// Aspect ratio for the generated charts.
const ASPECT_RATIO: f64 = 0.5625;
/// Size of the X-axis labels.
const X_LABEL_SIZE: i32 = 20;
/// Size of the Y-axis labels.
const Y_LABEL_SIZE: i32 = 20;
/// Marker colors assigned to overlays in order.
const OVERLAY_COLORS: [RGBColor; 4] = [GREEN, BLUE, MAGENTA, CYAN];

/// Output formats for the generated charts with output filename.
#[derive(Default)]
pub enum DrawOutput {
    /// Save to the output SVG file.
    Svg(String),
    /// Save to the output PNG file.
    Png(String),
    /// Print to the current console (not implemented).
    #[default]
    Inner,
}

/// Configuration options for chart generation.
#[derive(Default)]
pub struct DrawOptions {
    /// Chart title.
    title: Option<String>,
    /// Output format and path.
    output: DrawOutput,
    /// Whether to show the volume pane.
    show_volume: bool,
    /// Whether to draw each overlay's average-cost line.
    show_average_cost: bool,
}

impl DrawOptions {
    /// Sets the chart title.
    pub fn title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the output format and path.
    pub fn draw_output(mut self, output: DrawOutput) -> Self {
        self.output = output;
        self
    }

    /// Enables or disables the volume pane.
    pub fn show_volume(mut self, show: bool) -> Self {
        self.show_volume = show;
        self
    }

    /// Enables or disables the average-cost lines.
    pub fn show_average_cost(mut self, show: bool) -> Self {
        self.show_average_cost = show;
        self
    }
}

/// Chart drawing utility for a price series and any number of backtest runs.
pub struct Draw<'d> {
    /// The series behind every chart.
    series: &'d PriceSeries,
    /// Labeled results whose purchases are overlaid on the price line.
    overlays: Vec<(String, &'d BacktestResult)>,
    /// Drawing options.
    options: DrawOptions,
}

impl<'d> Draw<'d> {
    /// Creates a new `Draw` for the given series.
    pub fn with_series(series: &'d PriceSeries) -> Self {
        Self {
            series,
            overlays: Vec::new(),
            options: DrawOptions::default(),
        }
    }

    /// Overlays a backtest result's purchase points (and average cost).
    pub fn with_result(mut self, label: impl ToString, result: &'d BacktestResult) -> Self {
        self.overlays.push((label.to_string(), result));
        self
    }

    /// Sets the drawing options.
    pub fn with_options(mut self, options: DrawOptions) -> Self {
        self.options = options;
        self
    }

    /// Generates and saves the chart based on the configured options.
    pub fn plot(&self) -> Result<()> {
        let title = self.options.title.as_deref().unwrap_or("Accumulation Chart");
        let mut height_factor = 1.0;
        if self.options.show_volume {
            height_factor += 0.4;
        }

        let bar_count = self.series.len() as u32;
        let width = 1280.max(10 * bar_count);
        let height = ((width as f64 * ASPECT_RATIO * height_factor) as u32).min(900);

        match &self.options.output {
            DrawOutput::Svg(path) => {
                let root = SVGBackend::new(path, (width, height)).into_drawing_area();
                root.fill(&WHITE).map_err(|e| Error::Plotters(e.to_string()))?;
                self.draw_chart(&root, title)
            }
            DrawOutput::Png(path) => {
                let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
                root.fill(&WHITE).map_err(|e| Error::Plotters(e.to_string()))?;
                self.draw_chart(&root, title)
            }
            DrawOutput::Inner => Err(Error::Plotters("Inner display is not implemented".to_string())),
        }
    }

    /// Draws the price chart and, when enabled, the volume pane below it.
    fn draw_chart<DB: DrawingBackend>(
        &self,
        drawing_area: &DrawingArea<DB, Shift>,
        title: &str,
    ) -> Result<()> {
        let total_height = drawing_area.dim_in_pixel().1 as f64;
        let volume_height = if self.options.show_volume {
            total_height * 0.25
        } else {
            0.0
        };
        let price_height = total_height - volume_height;

        let (price_area, volume_area) = if self.options.show_volume {
            drawing_area.split_vertically(price_height as u32)
        } else {
            (drawing_area.clone(), drawing_area.clone())
        };

        self.draw_price_chart(&price_area, title)?;
        if self.options.show_volume {
            self.draw_volume_chart(&volume_area)?;
        }

        drawing_area.present().map_err(|e| Error::Plotters(e.to_string()))
    }

    /// Draws the close-price line, purchase markers and average-cost lines.
    fn draw_price_chart<DB: DrawingBackend>(
        &self,
        drawing_area: &DrawingArea<DB, Shift>,
        title: &str,
    ) -> Result<()> {
        let min_price = self.series.bars().map(|b| b.low()).fold(f64::INFINITY, f64::min);
        let max_price = self
            .series
            .bars()
            .map(|b| b.high())
            .fold(f64::NEG_INFINITY, f64::max);
        let first_date = self.series.first().date();
        let last_date = self.series.last().date();
        let price_range = max_price - min_price;
        let price_padding = price_range * 0.1;

        let drawing_area = drawing_area.margin(10, 10, 70, 70);
        let mut chart = ChartBuilder::on(&drawing_area)
            .caption(title, ("sans-serif", 30).into_font())
            .x_label_area_size(X_LABEL_SIZE)
            .y_label_area_size(Y_LABEL_SIZE)
            .build_cartesian_2d(
                first_date..last_date,
                min_price - price_padding..max_price + price_padding,
            )
            .map_err(|e| Error::Plotters(e.to_string()))?;

        let x_labels = self.series.len() / 15;
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price")
            .x_label_style(("sans-serif", X_LABEL_SIZE))
            .y_label_style(("sans-serif", Y_LABEL_SIZE))
            .x_labels(x_labels.max(4))
            .y_labels(5)
            .draw()
            .map_err(|e| Error::Plotters(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(
                self.series.bars().map(|b| (b.date(), b.close())),
                RGBColor(128, 128, 128),
            ))
            .map_err(|e| Error::Plotters(e.to_string()))?;

        for (index, (label, result)) in self.overlays.iter().enumerate() {
            let color = OVERLAY_COLORS[index % OVERLAY_COLORS.len()];

            chart
                .draw_series(
                    result
                        .purchases()
                        .map(|p| Circle::new((p.date(), p.price()), 4, color.filled())),
                )
                .map_err(|e| Error::Plotters(e.to_string()))?
                .label(label.clone())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));

            if self.options.show_average_cost {
                let average_cost = result.average_cost();
                chart
                    .draw_series(LineSeries::new(
                        [(first_date, average_cost), (last_date, average_cost)],
                        color.stroke_width(2),
                    ))
                    .map_err(|e| Error::Plotters(e.to_string()))?;
            }
        }

        if !self.overlays.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(RGBColor(128, 128, 128))
                .draw()
                .map_err(|e| Error::Plotters(e.to_string()))?;
        }

        Ok(())
    }

    /// Draws the volume pane.
    fn draw_volume_chart<DB: DrawingBackend>(
        &self,
        drawing_area: &DrawingArea<DB, Shift>,
    ) -> Result<()> {
        let max_volume = self
            .series
            .bars()
            .map(|b| b.volume())
            .fold(f64::NEG_INFINITY, f64::max);
        let volume_padding = max_volume * 0.1;
        let first_date = self.series.first().date();
        let last_date = self.series.last().date();
        let drawing_area = drawing_area.margin(0, 10, 70, 70);

        let mut chart = ChartBuilder::on(&drawing_area)
            .x_label_area_size(X_LABEL_SIZE)
            .y_label_area_size(Y_LABEL_SIZE)
            .build_cartesian_2d(first_date..last_date, 0.0..max_volume + volume_padding)
            .map_err(|e| Error::Plotters(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .x_label_style(("sans-serif", X_LABEL_SIZE))
            .y_label_style(("sans-serif", Y_LABEL_SIZE))
            .x_labels((self.series.len() / 15).max(4))
            .y_labels(3)
            .draw()
            .map_err(|e| Error::Plotters(e.to_string()))?;

        chart
            .draw_series(self.series.bars().map(|b| {
                let color = if b.close() >= b.open() {
                    GREEN.mix(0.3)
                } else {
                    RED.mix(0.3)
                };
                Rectangle::new(
                    [
                        (b.date(), 0.0),
                        (advance_one_day(b.date()), b.volume()),
                    ],
                    color.filled(),
                )
            }))
            .map(|_| ())
            .map_err(|e| Error::Plotters(e.to_string()))
    }
}

fn advance_one_day(date: NaiveDate) -> NaiveDate {
    date + Duration::days(1)
}
