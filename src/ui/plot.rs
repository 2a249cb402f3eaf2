use std::f64::consts::TAU;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, PlotUi, Points, Polygon};

use crate::charts::{ChartKind, ChartSpec, PieSlice, ScatterSeries};
use crate::color::ColorMap;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 280.0;

/// Number of marker sizes used for the price-scaled scatter.
const SIZE_BUCKETS: usize = 5;

// ---------------------------------------------------------------------------
// Chart rendering (central panel)
// ---------------------------------------------------------------------------

/// Render every chart descriptor of the current state.
pub fn charts(ui: &mut Ui, state: &AppState) {
    for spec in &state.charts {
        ui.add_space(8.0);
        ui.heading(spec.title);

        if spec.is_empty() {
            ui.label("No data for the current selection.");
            continue;
        }

        match &spec.kind {
            ChartKind::Bar { bars } => {
                let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
                let chart = BarChart::new(
                    bars.iter()
                        .enumerate()
                        .map(|(i, b)| {
                            Bar::new(i as f64, b.value)
                                .name(&b.label)
                                .fill(state.category_colors.color_for(&b.label))
                                .width(0.6)
                        })
                        .collect(),
                );
                base_plot(spec)
                    .x_axis_formatter(move |mark, _range| {
                        let i = mark.value.round();
                        if (mark.value - i).abs() > f64::EPSILON || i < 0.0 {
                            return String::new();
                        }
                        labels.get(i as usize).cloned().unwrap_or_default()
                    })
                    .show(ui, |plot_ui| plot_ui.bar_chart(chart));
            }
            ChartKind::Scatter { series, max_size } => {
                base_plot(spec)
                    .legend(Legend::default())
                    .show(ui, |plot_ui| {
                        for s in series {
                            draw_scatter(plot_ui, s, *max_size, &state.category_colors);
                        }
                    });
            }
            ChartKind::Line { points } => {
                let line: PlotPoints = points.iter().copied().collect();
                base_plot(spec).show(ui, |plot_ui| {
                    plot_ui.line(Line::new(line).name("Abandonment rate").width(2.0));
                    plot_ui.points(
                        Points::new(points.iter().copied().collect::<PlotPoints>()).radius(3.0),
                    );
                });
            }
            ChartKind::Pie { slices } => {
                base_plot(spec)
                    .legend(Legend::default())
                    .data_aspect(1.0)
                    .show_axes(false)
                    .show_grid(false)
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .show(ui, |plot_ui| draw_pie(plot_ui, slices, &state.payment_colors));
            }
        }
    }
}

fn base_plot(spec: &ChartSpec) -> Plot {
    Plot::new(spec.id)
        .height(CHART_HEIGHT)
        .x_axis_label(spec.x_label)
        .y_axis_label(spec.y_label)
        .allow_boxed_zoom(true)
}

/// One `Points` item per marker size; they share the series name so the
/// legend shows a single entry per category.
fn draw_scatter(plot_ui: &mut PlotUi, series: &ScatterSeries, max_size: f64, colors: &ColorMap) {
    let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); SIZE_BUCKETS];
    for p in &series.points {
        let scale = if max_size > 0.0 {
            (p.size / max_size).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bucket = (scale * (SIZE_BUCKETS - 1) as f64).round() as usize;
        buckets[bucket].push([p.x, p.y]);
    }

    let color = colors.color_for(&series.name);
    for (i, pts) in buckets.into_iter().enumerate() {
        if pts.is_empty() {
            continue;
        }
        plot_ui.points(
            Points::new(PlotPoints::from(pts))
                .name(&series.name)
                .color(color.gamma_multiply(0.8))
                .radius(2.0 + 2.0 * i as f32)
                .filled(true),
        );
    }
}

/// Unit-circle wedges, clockwise from twelve o'clock. Filled polygons must
/// be convex, so each slice is drawn as pieces of at most a quarter turn
/// sharing one legend name.
fn draw_pie(plot_ui: &mut PlotUi, slices: &[PieSlice], colors: &ColorMap) {
    const STEPS_PER_TURN: f64 = 96.0;
    let mut start = 0.0_f64;
    for slice in slices {
        let sweep = slice.share * TAU;
        let name = format!("{} ({:.1}%)", slice.label, slice.share * 100.0);
        let color = colors.color_for(&slice.label);

        let pieces = (slice.share * 4.0).ceil().max(1.0) as usize;
        let piece_sweep = sweep / pieces as f64;
        let steps = (piece_sweep / TAU * STEPS_PER_TURN).ceil().max(2.0) as usize;

        for piece in 0..pieces {
            let from = start + piece_sweep * piece as f64;
            let mut pts = vec![[0.0, 0.0]];
            for s in 0..=steps {
                let angle = from + piece_sweep * s as f64 / steps as f64;
                pts.push([angle.sin(), angle.cos()]);
            }
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(pts))
                    .name(&name)
                    .fill_color(color)
                    .stroke(Stroke::new(1.0, Color32::WHITE)),
            );
        }
        start += sweep;
    }
}
