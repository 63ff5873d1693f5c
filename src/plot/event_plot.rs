//! Combined CPU timeline for several threads.
//!
//! `EventPlot` holds the merged events of every thread. Building it does
//! not render anything; `render_svg` draws one row per lane with a bar
//! per event, coloured by thread, plus a legend.

use crate::assert::Event;
use crate::utils::config::{DEFAULT_PLOT_WIDTH, LABEL_MARGIN, LANE_HEIGHT};
use crate::utils::error::PlotError;
use log::info;
use serde::{Deserialize, Serialize};

/// Plot rendering configuration
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub title: String,
    pub width: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title: "Scheduler Timeline".to_string(),
            width: DEFAULT_PLOT_WIDTH,
        }
    }
}

impl PlotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Events of several threads laid out over CPU lanes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlot {
    pub events: Vec<Event>,

    /// Thread display names, one legend entry each
    pub names: Vec<String>,

    /// Label prefix for every lane, e.g. "CPU: "
    pub lane_prefix: String,

    pub num_lanes: usize,
}

const PALETTE: &[&str] = &[
    "rgb(70, 130, 180)",  // Steel Blue
    "rgb(255, 140, 0)",   // Dark Orange
    "rgb(34, 139, 34)",   // Forest Green
    "rgb(220, 20, 60)",   // Crimson
    "rgb(138, 43, 226)",  // Blue Violet
    "rgb(0, 139, 139)",   // Dark Cyan
    "rgb(184, 134, 11)",  // Dark Goldenrod
    "rgb(199, 21, 133)",  // Medium Violet Red
];

impl EventPlot {
    pub fn new(
        events: Vec<Event>,
        names: Vec<String>,
        lane_prefix: impl Into<String>,
        num_lanes: usize,
    ) -> Self {
        Self {
            events,
            names,
            lane_prefix: lane_prefix.into(),
            num_lanes,
        }
    }

    /// Earliest start and latest end over all events
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let start = self.events.iter().map(|e| e.start).min_by(f64::total_cmp)?;
        let end = self.events.iter().map(|e| e.end).max_by(f64::total_cmp)?;
        Some((start, end))
    }

    fn color_of(&self, name: &str) -> &'static str {
        let index = self.names.iter().position(|n| n == name).unwrap_or(0);
        PALETTE[index % PALETTE.len()]
    }

    /// Render the plot as SVG
    ///
    /// **Public** - the display step of a plot
    ///
    /// # Errors
    /// * `PlotError::NoEvents` - nothing to draw
    pub fn render_svg(&self, config: &PlotConfig) -> Result<String, PlotError> {
        let (t0, t1) = self.time_range().ok_or(PlotError::NoEvents)?;

        info!(
            "Rendering {} events over {} lanes",
            self.events.len(),
            self.num_lanes
        );

        let width = config.width.max(LABEL_MARGIN + 100);
        let plot_width = (width - LABEL_MARGIN - 20) as f64;
        let lanes = self.num_lanes.max(1);
        let graph_height = lanes * LANE_HEIGHT;
        let legend_height = 30 + 20 * self.names.len().div_ceil(4);
        let total_height = 40 + graph_height + legend_height;
        let span = if t1 > t0 { t1 - t0 } else { 1.0 };

        let mut svg = String::new();

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, total_height, width, total_height
        ));
        svg.push_str(
            r#"<style>.event { stroke: white; stroke-width: 0.5; } .event:hover { stroke: black; cursor: pointer; }</style>"#,
        );
        svg.push_str(&format!(
            r#"<text x="{}" y="20" font-size="16" text-anchor="middle" font-weight="bold">{}</text>"#,
            width / 2,
            escape(&config.title)
        ));

        // Lane labels and separators
        for lane in 0..lanes {
            let y = 40 + lane * LANE_HEIGHT;
            svg.push_str(&format!(
                r#"<text x="4" y="{}" font-size="12">{}{}</text>"#,
                y + LANE_HEIGHT / 2 + 4,
                escape(&self.lane_prefix),
                lane
            ));
            svg.push_str(&format!(
                r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#ddd"/>"##,
                LABEL_MARGIN,
                y + LANE_HEIGHT,
                width - 20,
                y + LANE_HEIGHT
            ));
        }

        for event in &self.events {
            let x = LABEL_MARGIN as f64 + (event.start - t0) / span * plot_width;
            let w = ((event.end - event.start) / span * plot_width).max(0.5);
            let y = 40 + event.lane * LANE_HEIGHT + 2;

            svg.push_str(&format!(
                r#"<rect x="{:.2}" y="{}" width="{:.2}" height="{}" fill="{}" class="event"><title>{} #{} [{:.6}, {:.6}]</title></rect>"#,
                x,
                y,
                w,
                LANE_HEIGHT - 4,
                self.color_of(&event.name),
                escape(&event.name),
                event.id,
                event.start,
                event.end
            ));
        }

        self.render_legend(&mut svg, 40 + graph_height + 25);

        svg.push_str("</svg>");

        info!("Plot rendered ({} bytes)", svg.len());
        Ok(svg)
    }

    fn render_legend(&self, out: &mut String, legend_y: usize) {
        out.push_str(&format!(
            r#"<text x="10" y="{}" font-size="14" font-weight="bold">Threads:</text>"#,
            legend_y
        ));

        for (i, name) in self.names.iter().enumerate() {
            let x = 80 + (i % 4) * 200;
            let y = legend_y + (i / 4) * 20;
            out.push_str(&format!(
                r#"<rect x="{}" y="{}" width="15" height="15" fill="{}" rx="2"/>"#,
                x,
                y - 12,
                self.color_of(name)
            ));
            out.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
                x + 20,
                y,
                escape(name)
            ));
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
