//! PDF report: title band, summary counts, two charts and a short listing
//!
//! Only the base-14 Helvetica fonts are used, so text is reduced to
//! WinAnsi-encodable characters before it is written.

use chrono::NaiveDateTime;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::error::Error;
use std::io::Write;

use crate::config::{AppConfig, Vocabulary};
use crate::dashboard::Metrics;
use crate::graph::{Raster, ReportChart};
use crate::record::LogRecord;

/// Listing columns: header, width in points, character budget
const LISTING_COLUMNS: [(&str, f32, usize); 4] = [
    ("Date", 110.0, 19),
    ("Branch", 100.0, 16),
    ("Category", 110.0, 18),
    ("Item", 175.0, 30),
];

const CHART_W: f32 = 240.0;
const CHART_H: f32 = 180.0;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub brand: String,
    pub row_limit: usize,
    pub generated_at: NaiveDateTime,
}

impl ReportOptions {
    pub fn from_config(config: &AppConfig, generated_at: NaiveDateTime) -> Self {
        Self {
            brand: config.brand.clone(),
            row_limit: config.report_row_limit,
            generated_at,
        }
    }

    pub fn title(&self) -> String {
        format!("{} Inventory Report", self.brand)
    }
}

/// Render the PDF report for a set of records
///
/// Charts that cannot be drawn are left out; the rest of the report is
/// produced regardless. An empty record set yields zero counts and an empty
/// listing.
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - The PDF document bytes or an error
pub fn to_pdf(
    records: &[LogRecord],
    vocabulary: &Vocabulary,
    options: &ReportOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let metrics = Metrics::compute(records, vocabulary);

    let charts: Vec<Raster> = [ReportChart::Category, ReportChart::Branch]
        .into_iter()
        .filter_map(|chart| match chart.render(records) {
            Ok(raster) => Some(raster),
            Err(e) => {
                log::debug!("{:?} chart left out of report: {}", chart, e);
                None
            }
        })
        .collect();

    let mut pdf = PdfReport::new();
    for chart in &charts {
        pdf.add_image(chart)?;
    }

    pdf.write_report(&options.title(), options, &metrics, records);
    Ok(pdf.finish(&options.title()))
}

/// Keep characters Helvetica can show with WinAnsi encoding
fn pdf_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Shorten `text` to at most `max` characters, marking the cut
///
/// Budgets under 4 characters leave no room for the marker and are cut
/// without it.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max < 4 {
        return text.chars().take(max).collect();
    }
    let keep = max - 3;
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

struct PdfReport {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    page_refs: Vec<Ref>,
    current_content_id: Option<Ref>,
    images: Vec<(String, Ref)>,

    page_w: f32,
    page_h: f32,
    margin: f32,
    row_h: f32,

    next_id: i32,
    font_id: Ref,
    bold_id: Ref,
}

impl PdfReport {
    fn new() -> Self {
        let mut pdf = Pdf::new();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);
        let bold_id = Ref::new(4);

        pdf.type1_font(font_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.type1_font(bold_id)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            page_refs: Vec::new(),
            current_content_id: None,
            images: Vec::new(),

            page_w: 595.0,
            page_h: 842.0,
            margin: 50.0,
            row_h: 18.0,

            next_id: 5,
            font_id,
            bold_id,
        }
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    /// Embed a raster as a Flate-compressed RGB image XObject
    fn add_image(&mut self, raster: &Raster) -> std::io::Result<()> {
        let id = self.fresh_ref();
        let data = compress(&raster.rgb)?;

        let mut image = self.pdf.image_xobject(id, &data);
        image.filter(Filter::FlateDecode);
        image.width(raster.width as i32);
        image.height(raster.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        self.images.push((format!("Im{}", self.images.len()), id));
        Ok(())
    }

    fn new_page(&mut self) -> Content {
        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();

        self.page_refs.push(page_id);

        let mut page = self.pdf.page(page_id);
        page.parent(self.pages_id)
            .media_box(Rect::new(0.0, 0.0, self.page_w, self.page_h))
            .contents(content_id);

        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            fonts.pair(Name(b"F1"), self.font_id);
            fonts.pair(Name(b"F2"), self.bold_id);
        }
        if !self.images.is_empty() {
            let mut objects = resources.x_objects();
            for (name, id) in &self.images {
                objects.pair(Name(name.as_bytes()), *id);
            }
        }
        resources.finish();
        page.finish();

        self.current_content_id = Some(content_id);

        let mut content = Content::new();
        let footer = format!("Page {}", self.page_refs.len());
        self.draw_text(
            &mut content,
            self.page_w - self.margin - 40.0,
            self.margin - 30.0,
            8.0,
            &footer,
        );
        content
    }

    fn finalize_page(&mut self, content: Content) {
        if let Some(id) = self.current_content_id.take() {
            self.pdf.stream(id, &content.finish());
        }
    }

    fn draw_styled_text(
        &self,
        content: &mut Content,
        font: Name,
        x: f32,
        y: f32,
        size: f32,
        text: &str,
    ) {
        content.begin_text();
        content.set_font(font, size);
        content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
        content.show(Str(&pdf_text(text)));
        content.end_text();
    }

    fn draw_text(&self, content: &mut Content, x: f32, y: f32, size: f32, text: &str) {
        self.draw_styled_text(content, Name(b"F1"), x, y, size, text);
    }

    fn fill_rect(&self, content: &mut Content, rgb: (f32, f32, f32), x: f32, y: f32, w: f32, h: f32) {
        content.save_state();
        content.set_fill_rgb(rgb.0, rgb.1, rgb.2);
        content.rect(x, y, w, h);
        content.fill_nonzero();
        content.restore_state();
    }

    fn draw_title_band(&self, content: &mut Content, title: &str, generated: &str) {
        let band_h = 80.0;
        self.fill_rect(
            content,
            (0.12, 0.31, 0.55),
            0.0,
            self.page_h - band_h,
            self.page_w,
            band_h,
        );

        content.save_state();
        content.set_fill_rgb(1.0, 1.0, 1.0);
        self.draw_styled_text(
            content,
            Name(b"F2"),
            self.margin,
            self.page_h - 42.0,
            20.0,
            title,
        );
        self.draw_text(content, self.margin, self.page_h - 62.0, 10.0, generated);
        content.restore_state();
    }

    fn draw_listing_header(&self, content: &mut Content, y: f32) {
        let width: f32 = LISTING_COLUMNS.iter().map(|(_, w, _)| *w).sum();
        self.fill_rect(content, (0.85, 0.87, 0.90), self.margin, y, width, self.row_h);

        let mut x = self.margin;
        for (header, w, _) in LISTING_COLUMNS {
            self.draw_styled_text(content, Name(b"F2"), x + 4.0, y + 5.0, 10.0, header);
            x += w;
        }
    }

    fn draw_listing_row(&self, content: &mut Content, y: f32, index: usize, record: &LogRecord) {
        if index % 2 == 0 {
            let width: f32 = LISTING_COLUMNS.iter().map(|(_, w, _)| *w).sum();
            self.fill_rect(content, (0.96, 0.96, 0.96), self.margin, y, width, self.row_h);
        }

        let values = [
            record.date.as_str(),
            record.branch.as_str(),
            record.category.as_str(),
            record.item.as_str(),
        ];
        let mut x = self.margin;
        for ((_, w, budget), value) in LISTING_COLUMNS.iter().zip(values) {
            self.draw_text(content, x + 4.0, y + 5.0, 9.0, &truncate(value, *budget));
            x += w;
        }
    }

    fn write_report(
        &mut self,
        title: &str,
        options: &ReportOptions,
        metrics: &Metrics,
        records: &[LogRecord],
    ) {
        let mut content = self.new_page();
        let generated = format!("Generated: {}", options.generated_at.format("%Y-%m-%d %H:%M"));
        self.draw_title_band(&mut content, title, &generated);

        // Summary
        let mut y = self.page_h - 115.0;
        self.draw_styled_text(&mut content, Name(b"F2"), self.margin, y, 14.0, "Summary");
        y -= 20.0;
        for line in [
            format!("Total records: {}", metrics.total),
            format!("Missing items: {}", metrics.missing),
            format!("New requests: {}", metrics.new_requests),
        ] {
            self.draw_text(&mut content, self.margin, y, 11.0, &line);
            y -= 16.0;
        }

        // Charts side by side
        if !self.images.is_empty() {
            let top = y - 6.0;
            let mut x = self.margin;
            for (name, _) in &self.images {
                content.save_state();
                content.transform([CHART_W, 0.0, 0.0, CHART_H, x, top - CHART_H]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
                x += CHART_W + 15.0;
            }
            y = top - CHART_H - 10.0;
        }

        // Listing
        let shown = records.len().min(options.row_limit);
        y -= 14.0;
        let heading = format!("Entries (first {} of {})", shown, records.len());
        self.draw_styled_text(&mut content, Name(b"F2"), self.margin, y, 12.0, &heading);
        y -= 8.0 + self.row_h;
        self.draw_listing_header(&mut content, y);

        if shown == 0 {
            y -= self.row_h;
            self.draw_text(&mut content, self.margin + 4.0, y + 5.0, 9.0, "No records.");
        }

        for (index, record) in records.iter().take(shown).enumerate() {
            if y - self.row_h < self.margin {
                self.finalize_page(content);
                content = self.new_page();
                y = self.page_h - self.margin - self.row_h;
                self.draw_listing_header(&mut content, y);
            }
            y -= self.row_h;
            self.draw_listing_row(&mut content, y, index, record);
        }

        self.finalize_page(content);
    }

    fn finish(mut self, title: &str) -> Vec<u8> {
        self.pdf.catalog(self.catalog_id).pages(self.pages_id);

        let mut pages = self.pdf.pages(self.pages_id);
        pages.count(self.page_refs.len() as i32);
        pages.kids(self.page_refs.clone());
        pages.finish();

        let info_id = self.fresh_ref();
        self.pdf
            .document_info(info_id)
            .title(TextStr(title))
            .creator(TextStr("mareero"));

        self.pdf.finish()
    }

    #[cfg(test)]
    fn page_count(&self) -> usize {
        self.page_refs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewEntry;
    use chrono::NaiveDate;

    fn options(row_limit: usize) -> ReportOptions {
        ReportOptions {
            brand: "Mareero".into(),
            row_limit,
            generated_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn records(n: usize) -> Vec<LogRecord> {
        (0..n)
            .map(|i| {
                NewEntry {
                    branch: "Main".into(),
                    employee: "Ali".into(),
                    category: "Missing".into(),
                    item: format!("Part {i}"),
                    note: String::new(),
                }
                .into_record("2025-03-01 09:00:00".into())
            })
            .collect()
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("a very long item name", 10), "a very ...");
        assert_eq!(truncate("abcd", 4), "abcd");
        assert_eq!(truncate("abcde", 4), "a...");
        assert_eq!(truncate("abc", 2), "ab");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn pdf_text_replaces_unencodable() {
        assert_eq!(pdf_text("Café"), b"Caf\xe9".to_vec());
        assert_eq!(pdf_text("Qaybta → 2"), b"Qaybta ? 2".to_vec());
    }

    #[test]
    fn listing_paginates() {
        let rows = records(60);
        let mut pdf = PdfReport::new();
        let metrics = Metrics::compute(&rows, &Vocabulary::english());
        let opts = options(60);
        pdf.write_report(&opts.title(), &opts, &metrics, &rows);
        assert!(pdf.page_count() >= 2);

        let mut short = PdfReport::new();
        short.write_report(&opts.title(), &options(15), &metrics, &rows);
        assert_eq!(short.page_count(), 1);
    }

    #[test]
    fn empty_report_is_a_pdf() {
        let bytes = to_pdf(&[], &Vocabulary::english(), &options(15)).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
