//! Plotting of simulation runs with gnuplot
//!
//! Series are collected first and drawn onto a single set of axes when the
//! figure is shown or saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Point2D, Pose2D, SimError, SimResult};
use crate::simulation::TickOutput;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const GRAY: &str = "#808080";

    pub const PATH: &str = RED;
    pub const WAYPOINT: &str = GRAY;
    pub const TRAJECTORY: &str = BLUE;
    pub const VEHICLE: &str = CYAN;
    pub const HEADING: &str = BLACK;
}

/// Style for line rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PATH, "Path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Series {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

pub struct Visualizer {
    series: Vec<Series>,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_label(&mut self, label: &str) -> &mut Self {
        self.x_label = label.to_string();
        self
    }

    pub fn set_y_label(&mut self, label: &str) -> &mut Self {
        self.y_label = label.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Number of series collected so far
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.series.push(Series::Lines { x: x.to_vec(), y: y.to_vec(), style: style.clone() });
        self
    }

    /// Plot sampled path poses as a line
    pub fn plot_poses(&mut self, poses: &[Pose2D], style: &PathStyle) -> &mut Self {
        let x: Vec<f64> = poses.iter().map(|p| p.x).collect();
        let y: Vec<f64> = poses.iter().map(|p| p.y).collect();
        self.plot_path_xy(&x, &y, style)
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        self.series.push(Series::Points { x, y, style: style.clone() });
        self
    }

    /// Plot the CG trajectory of a run
    pub fn plot_trajectory(&mut self, ticks: &[TickOutput], style: &PathStyle) -> &mut Self {
        let x: Vec<f64> = ticks.iter().map(|t| t.state.x).collect();
        let y: Vec<f64> = ticks.iter().map(|t| t.state.y).collect();
        self.plot_path_xy(&x, &y, style)
    }

    /// Plot vehicle pose with heading indicator
    pub fn plot_vehicle(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        self.plot_points(&[pose.point()], &PointStyle::new(colors::VEHICLE, "Vehicle").with_size(size));

        let arrow_len = size * 1.5;
        let end = pose.point() + Point2D::new(arrow_len * pose.theta.cos(), arrow_len * pose.theta.sin());
        self.plot_path_xy(
            &[pose.x, end.x],
            &[pose.y, end.y],
            &PathStyle::new(colors::HEADING, "").with_line_width(2.0),
        )
    }

    pub fn show(&mut self) -> SimResult<()> {
        let mut figure = self.render();
        figure.show().map_err(|e| SimError::Plot(e.to_string()))?;
        Ok(())
    }

    /// Save plot to a PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> SimResult<()> {
        let mut figure = self.render();
        figure.save_to_png(path, width, height).map_err(|e| SimError::Plot(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for series in &self.series {
            match series {
                Series::Lines { x, y, style } => {
                    axes.lines(
                        x,
                        y,
                        &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            LineWidth(style.line_width),
                        ],
                    );
                }
                Series::Points { x, y, style } => {
                    axes.points(
                        x,
                        y,
                        &[
                            Caption(style.caption.as_str()),
                            Color(style.color.as_str()),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ],
                    );
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
