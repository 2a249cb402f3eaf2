//! Declarative chart descriptors.
//!
//! Built from a filtered view and its [`MetricsSnapshot`]; the UI layer
//! turns them into `egui_plot` items.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::filter::FilteredView;
use crate::metrics::MetricsSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Marker size driver (the sale price).
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Fraction of the whole pie in `[0, 1]`.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartKind {
    Bar { bars: Vec<Bar> },
    Scatter { series: Vec<ScatterSeries>, max_size: f64 },
    Line { points: Vec<[f64; 2]> },
    Pie { slices: Vec<PieSlice> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Stable identifier, used as the plot id in the UI.
    pub id: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub kind: ChartKind,
}

impl ChartSpec {
    /// Whether there is anything to draw.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            ChartKind::Bar { bars } => bars.is_empty(),
            ChartKind::Scatter { series, .. } => series.iter().all(|s| s.points.is_empty()),
            ChartKind::Line { points } => points.is_empty(),
            ChartKind::Pie { slices } => slices.is_empty(),
        }
    }
}

/// The four dashboard charts, in display order.
pub fn build_charts(view: &FilteredView<'_>, snapshot: &MetricsSnapshot) -> Vec<ChartSpec> {
    vec![
        category_sales(snapshot),
        discount_vs_loyalty(view),
        abandonment_by_age(snapshot),
        payment_distribution(snapshot),
    ]
}

fn category_sales(snapshot: &MetricsSnapshot) -> ChartSpec {
    ChartSpec {
        id: "category_sales",
        title: "Sales by Product Category",
        x_label: "Product Category",
        y_label: "Total Sales (INR)",
        kind: ChartKind::Bar {
            bars: snapshot
                .sales_by_category
                .iter()
                .map(|c| Bar {
                    label: c.category.clone(),
                    value: c.sales,
                })
                .collect(),
        },
    }
}

fn discount_vs_loyalty(view: &FilteredView<'_>) -> ChartSpec {
    let mut by_category: BTreeMap<&str, Vec<ScatterPoint>> = BTreeMap::new();
    let mut max_size: f64 = 0.0;
    for rec in view.records() {
        max_size = max_size.max(rec.price);
        by_category
            .entry(&rec.product_category)
            .or_default()
            .push(ScatterPoint {
                x: rec.discount_applied,
                y: rec.loyalty_points,
                size: rec.price,
            });
    }

    ChartSpec {
        id: "discount_loyalty",
        title: "Discounts vs Loyalty Points",
        x_label: "Discount Applied (INR)",
        y_label: "Loyalty Points Earned",
        kind: ChartKind::Scatter {
            series: by_category
                .into_iter()
                .map(|(name, points)| ScatterSeries {
                    name: name.to_string(),
                    points,
                })
                .collect(),
            max_size,
        },
    }
}

fn abandonment_by_age(snapshot: &MetricsSnapshot) -> ChartSpec {
    ChartSpec {
        id: "abandonment_by_age",
        title: "Cart Abandonment Rate by Age Group",
        x_label: "Age Group",
        y_label: "Abandonment Rate (%)",
        kind: ChartKind::Line {
            points: snapshot
                .abandonment_by_age
                .iter()
                .map(|a| [a.age as f64, a.rate])
                .collect(),
        },
    }
}

fn payment_distribution(snapshot: &MetricsSnapshot) -> ChartSpec {
    let total: usize = snapshot.payment_methods.iter().map(|p| p.count).sum();
    ChartSpec {
        id: "payment_methods",
        title: "Payment Method Distribution",
        x_label: "",
        y_label: "",
        kind: ChartKind::Pie {
            slices: snapshot
                .payment_methods
                .iter()
                .map(|p| PieSlice {
                    label: p.method.clone(),
                    value: p.count as f64,
                    share: if total == 0 {
                        0.0
                    } else {
                        p.count as f64 / total as f64
                    },
                })
                .collect(),
        },
    }
}
