use super::{Output, group_thousands};
use crate::error::Error;
use crate::pricer::PortfolioIndicators;

use image::{ImageFormat, Rgb, RgbImage};
use log::{debug, warn};

mod font;
use font::{GLYPH_HEIGHT, draw_text, text_width};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;
const MARGIN_LEFT: u32 = 130;
const MARGIN_RIGHT: u32 = 40;
const MARGIN_TOP: u32 = 90;
const MARGIN_BOTTOM: u32 = 90;
const TICKS: u32 = 5;

const TITLE: &str = "PORTFOLIO DISTRIBUTION BY CURRENT VALUE";
const X_LABEL: &str = "STOCK TICKER";
const Y_LABEL: &str = "CURRENT MARKET VALUE ($)";

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const TEXT: Rgb<u8> = Rgb([30, 30, 30]);

const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

impl From<image::ImageError> for Error {
    fn from(error: image::ImageError) -> Self {
        Error::new_output(format!("image error : {error}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// One bar per priced holding, or per ticker sorted by decreasing value when grouped.
pub fn make_bars(indicators: &PortfolioIndicators, group_by_ticker: bool) -> Vec<Bar> {
    let mut bars: Vec<Bar> = Vec::with_capacity(indicators.positions.len());
    for position in indicators.positions.iter() {
        let existing = if group_by_ticker {
            bars.iter_mut().find(|bar| bar.label == position.ticker)
        } else {
            None
        };
        match existing {
            Some(bar) => bar.value += position.current_value,
            None => bars.push(Bar {
                label: position.ticker.clone(),
                value: position.current_value,
            }),
        }
    }
    if group_by_ticker {
        bars.sort_by(|lhs, rhs| rhs.value.total_cmp(&lhs.value));
    }
    bars
}

/// Smallest 1, 2 or 5 times a power of ten that is not below `value`.
pub fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|step| step * magnitude)
        .find(|candidate| *candidate >= value)
        .unwrap_or(10.0 * magnitude)
}

pub fn viridis(ratio: f64) -> Rgb<u8> {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = ratio * (VIRIDIS.len() - 1) as f64;
    let index = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let fraction = scaled - index as f64;
    let (from, to) = (VIRIDIS[index], VIRIDIS[index + 1]);
    let mix = |channel: usize| {
        (f64::from(from[channel]) + (f64::from(to[channel]) - f64::from(from[channel])) * fraction)
            .round() as u8
    };
    Rgb([mix(0), mix(1), mix(2)])
}

fn fill_rect(image: &mut RgbImage, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
    let x_begin = x.max(0);
    let y_begin = y.max(0);
    let x_end = (x + i64::from(width)).min(i64::from(image.width()));
    let y_end = (y + i64::from(height)).min(i64::from(image.height()));
    for pixel_y in y_begin..y_end {
        for pixel_x in x_begin..x_end {
            image.put_pixel(pixel_x as u32, pixel_y as u32, color);
        }
    }
}

fn draw_centered_text(image: &mut RgbImage, center_x: i64, y: i64, text: &str, scale: u32) {
    let x = center_x - i64::from(text_width(text, scale)) / 2;
    draw_text(image, x, y, text, scale, TEXT);
}

fn format_axis_value(value: f64) -> String {
    format!("${}", group_thousands(&format!("{:.0}", value.max(0.0))))
}

pub fn render(bars: &[Bar]) -> RgbImage {
    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let plot_left = i64::from(MARGIN_LEFT);
    let plot_bottom = i64::from(MARGIN_TOP + plot_height);

    draw_centered_text(&mut image, i64::from(WIDTH / 2), 20, TITLE, 3);
    draw_text(&mut image, 10, i64::from(MARGIN_TOP) - 30, Y_LABEL, 2, TEXT);
    draw_centered_text(
        &mut image,
        plot_left + i64::from(plot_width / 2),
        i64::from(HEIGHT) - 30,
        X_LABEL,
        2,
    );

    let max_value = bars.iter().map(|bar| bar.value).fold(0.0, f64::max);
    let axis_max = nice_ceiling(max_value);

    for tick in 0..=TICKS {
        let tick_value = axis_max * f64::from(tick) / f64::from(TICKS);
        let y = plot_bottom - i64::from(plot_height * tick / TICKS);
        fill_rect(&mut image, plot_left, y, plot_width, 1, GRID);
        let label = format_axis_value(tick_value);
        let label_x = plot_left - 10 - i64::from(text_width(&label, 1));
        draw_text(&mut image, label_x, y - i64::from(GLYPH_HEIGHT / 2), &label, 1, TEXT);
    }

    if !bars.is_empty() {
        let slot = plot_width / bars.len() as u32;
        let bar_width = (slot * 3 / 5).max(1);
        for (position, bar) in bars.iter().enumerate() {
            let ratio = if max_value > 0.0 { bar.value / max_value } else { 0.0 };
            let bar_height = ((bar.value.max(0.0) / axis_max) * f64::from(plot_height)).round() as u32;
            let slot_left = plot_left + i64::from(slot * position as u32);
            let center_x = slot_left + i64::from(slot / 2);
            let bar_left = center_x - i64::from(bar_width / 2);
            let bar_top = plot_bottom - i64::from(bar_height);
            fill_rect(&mut image, bar_left, bar_top, bar_width, bar_height, viridis(ratio));

            let label_scale = if text_width(&bar.label, 2) <= slot { 2 } else { 1 };
            draw_centered_text(&mut image, center_x, plot_bottom + 10, &bar.label, label_scale);

            let value_label = format_axis_value(bar.value);
            if text_width(&value_label, 1) <= slot {
                draw_centered_text(&mut image, center_x, bar_top - 12, &value_label, 1);
            }
        }
    }

    fill_rect(&mut image, plot_left, i64::from(MARGIN_TOP), 2, plot_height + 1, AXIS);
    fill_rect(&mut image, plot_left, plot_bottom, plot_width, 2, AXIS);
    image
}

pub struct ChartOutput {
    output_filename: String,
    bars: Vec<Bar>,
}

impl ChartOutput {
    pub fn new(output_filename: &str, indicators: &PortfolioIndicators, group_by_ticker: bool) -> Self {
        Self {
            output_filename: output_filename.to_string(),
            bars: make_bars(indicators, group_by_ticker),
        }
    }
}

impl Output for ChartOutput {
    fn write(&mut self) -> Result<(), Error> {
        if self.bars.is_empty() {
            warn!("no priced holding, chart {} not written", self.output_filename);
            return Ok(());
        }
        debug!("render chart with {} bar(s)", self.bars.len());
        let image = render(&self.bars);
        image.save_with_format(&self.output_filename, ImageFormat::Png)?;
        Ok(())
    }
}
