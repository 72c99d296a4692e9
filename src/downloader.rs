use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook};
use std::error::Error;

use crate::record::{HEADERS, LogRecord};

pub const PDF_MIME: &str = "application/pdf";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Download name of the PDF report, e.g. `Mareero_Report_2025-03-01.pdf`
pub fn report_file_name(brand: &str, date: NaiveDate) -> String {
    format!("{}_Report_{}.pdf", brand, date.format("%Y-%m-%d"))
}

/// Download name of the Excel export, e.g. `Mareero_Data_2025-03-01.xlsx`
pub fn data_file_name(brand: &str, date: NaiveDate) -> String {
    format!("{}_Data_{}.xlsx", brand, date.format("%Y-%m-%d"))
}

/// Convert the records to XLSX format
///
/// Writes the six business columns verbatim to a single sheet named
/// `Sheet1`: one header row, then one row per record, every cell as text.
/// Each column is as wide as its longest value, header included. An empty
/// record set produces a sheet with only the header row.
///
/// # Arguments
/// * `records` - Records in table order
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn to_xlsx(records: &[LogRecord]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Sheet1")?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E8C))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (r, record) in records.iter().enumerate() {
        let row = (r + 1) as u32;
        for (col, value) in record.to_row().iter().enumerate() {
            worksheet.write_string(row, col as u16, *value)?;
        }
    }

    for (col, width) in column_widths(records).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Column widths in characters: longest value or header, plus padding
pub fn column_widths(records: &[LogRecord]) -> Vec<usize> {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for record in records {
        for (col, value) in record.to_row().iter().enumerate() {
            widths[col] = widths[col].max(value.chars().count());
        }
    }
    widths.into_iter().map(|w| w + 2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_pattern() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(report_file_name("Mareero", date), "Mareero_Report_2025-03-01.pdf");
        assert_eq!(data_file_name("Mareero", date), "Mareero_Data_2025-03-01.xlsx");
    }

    #[test]
    fn widths_cover_header_and_values() {
        assert_eq!(column_widths(&[]), vec![6, 8, 10, 10, 6, 6]);
    }
}
