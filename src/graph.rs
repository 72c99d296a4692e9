use crate::dashboard::{branch_counts, category_counts};
use crate::record::LogRecord;
use plotters::prelude::*;
use std::io::Cursor;

/// Available graph types for the report charts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphType {
    /// Pie chart - share of each value in the whole
    Pie,

    /// Bar graph - Compares counts across different values with vertical bars
    Bar,
}

/// Configuration options for graph generation
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis (bar graphs only)
    pub x_label: String,

    /// Label for the Y-axis (bar graphs only)
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,

    /// Type of graph to generate
    pub graph_type: GraphType,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            x_label: String::new(),
            y_label: "Count".to_string(),
            width: 800,
            height: 600,
            graph_type: GraphType::Bar,
        }
    }
}

/// Uncompressed 8-bit RGB image produced by the chart renderer
#[derive(Clone, Debug)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Raster {
    /// Encode the raster as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or("raster buffer does not match its dimensions")?;

        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)?;
        Ok(buffer)
    }
}

/// The charts shown on the dashboard and in the PDF report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportChart {
    /// Share of each Category value
    Category,
    /// Number of records per Branch
    Branch,
}

impl ReportChart {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "category" => Some(ReportChart::Category),
            "branch" => Some(ReportChart::Branch),
            _ => None,
        }
    }

    pub fn options(self) -> GraphOptions {
        match self {
            ReportChart::Category => GraphOptions {
                title: "Category distribution".to_string(),
                graph_type: GraphType::Pie,
                ..Default::default()
            },
            ReportChart::Branch => GraphOptions {
                title: "Records per branch".to_string(),
                x_label: "Branch".to_string(),
                graph_type: GraphType::Bar,
                ..Default::default()
            },
        }
    }

    /// Render the chart for a set of records
    ///
    /// # Errors
    /// * Returns an error when there are no records to chart
    /// * Returns an error if the plotting backend fails (missing fonts, etc.)
    pub fn render(self, records: &[LogRecord]) -> Result<Raster, Box<dyn std::error::Error>> {
        let data = match self {
            ReportChart::Category => category_counts(records),
            ReportChart::Branch => branch_counts(records),
        };
        create_graph(&data, &self.options())
    }
}

const SLICE_COLORS: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Creates a graph from labelled counts
///
/// # Arguments
/// * `data` - `(label, count)` pairs in display order
/// * `options` - Graph styling and type options
///
/// # Returns
/// * A Result containing the rendered RGB raster or an error
pub fn create_graph(
    data: &[(String, usize)],
    options: &GraphOptions,
) -> Result<Raster, Box<dyn std::error::Error>> {
    if data.iter().all(|(_, count)| *count == 0) {
        return Err("no data to chart".into());
    }

    let mut rgb = vec![0u8; (options.width * options.height * 3) as usize];
    match options.graph_type {
        GraphType::Pie => create_pie_graph(data, options, &mut rgb)?,
        GraphType::Bar => create_bar_graph(data, options, &mut rgb)?,
    }

    Ok(Raster {
        width: options.width,
        height: options.height,
        rgb,
    })
}

/// Draws a pie chart with one slice per label
///
/// Slices are labelled with their value and percentage.
fn create_pie_graph(
    data: &[(String, usize)],
    options: &GraphOptions,
    buffer: &mut [u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(buffer, (options.width, options.height))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let root = root.titled(&options.title, ("sans-serif", 30).into_font())?;

    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = (w.min(h) as f64 / 2.0) * 0.7;

    let sizes: Vec<f64> = data.iter().map(|(_, count)| *count as f64).collect();
    let labels: Vec<&str> = data.iter().map(|(label, _)| label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..data.len())
        .map(|i| SLICE_COLORS[i % SLICE_COLORS.len()])
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 16).into_font().color(&WHITE));
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}

/// Draws a bar graph with one bar per label
fn create_bar_graph(
    data: &[(String, usize)],
    options: &GraphOptions,
    buffer: &mut [u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(buffer, (options.width, options.height))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let bars = data.len() as u32;
    let max_y = data.iter().map(|(_, count)| *count as u32).max().unwrap_or(0);
    let labels: Vec<&str> = data.iter().map(|(label, _)| label.as_str()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d((0u32..bars).into_segmented(), 0u32..max_y + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .x_labels(data.len())
        .x_label_formatter(&|value: &SegmentValue<u32>| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels
                .get(*i as usize)
                .map(|label| label.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(10)
            .data(
                data.iter()
                    .enumerate()
                    .map(|(i, (_, count))| (i as u32, *count as u32)),
            ),
    )?;

    root.present()?;
    Ok(())
}
