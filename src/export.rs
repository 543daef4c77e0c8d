// src/export.rs - Sit-in report rendering: CSV, Excel (SpreadsheetML), HTML

use crate::error::{ApiError, ApiResult};
use crate::models::SitInRecord;

const HEADERS: [&str; 9] = [
    "ID",
    "Student ID",
    "Student Name",
    "Purpose",
    "Laboratory",
    "Login Time",
    "Logout Time",
    "Duration (minutes)",
    "Status",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date bounds the report was filtered by, echoed in the rendered output.
#[derive(Debug, Default, Clone)]
pub struct ReportRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ReportRange {
    fn label(&self) -> Option<String> {
        if self.from.is_none() && self.to.is_none() {
            return None;
        }
        Some(format!(
            "From: {} To: {}",
            self.from.as_deref().unwrap_or("beginning"),
            self.to.as_deref().unwrap_or("today"),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn from_key(key: &str) -> ApiResult<Self> {
        match key {
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ApiError::unsupported_format(other)),
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "sit_in_report.csv",
            ExportFormat::Excel => "sit_in_report.xls",
            ExportFormat::Pdf => "sit_in_report.html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => "application/vnd.ms-excel",
            ExportFormat::Pdf => "text/html",
        }
    }
}

fn row_fields(record: &SitInRecord) -> [String; 9] {
    [
        record.id.to_string(),
        record.student_id.to_string(),
        record.student_name.clone(),
        record.purpose.clone(),
        record.lab_name.clone(),
        record.login_time.format(TIME_FORMAT).to_string(),
        record
            .logout_time
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default(),
        record.duration_minutes().to_string(),
        record.status.clone(),
    ]
}

/// The range line only appears in the HTML report; the delimited formats
/// carry bare rows.
pub fn render(
    format: ExportFormat,
    records: &[SitInRecord],
    range: &ReportRange,
) -> ApiResult<Vec<u8>> {
    match format {
        ExportFormat::Csv => render_csv(records),
        ExportFormat::Excel => Ok(render_excel(records).into_bytes()),
        ExportFormat::Pdf => Ok(render_html(records, range).into_bytes()),
    }
}

fn render_csv(records: &[SitInRecord]) -> ApiResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(HEADERS)
        .map_err(|e| ApiError::InternalServerError(format!("CSV write failed: {}", e)))?;
    for record in records {
        writer
            .write_record(row_fields(record))
            .map_err(|e| ApiError::InternalServerError(format!("CSV write failed: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| ApiError::InternalServerError(format!("CSV write failed: {}", e)))
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// SpreadsheetML 2003 workbook. Excel opens it natively from an .xls
/// attachment, which keeps the export free of a binary writer dependency.
fn render_excel(records: &[SitInRecord]) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0"?>"#);
    out.push('\n');
    out.push_str(
        r#"<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet"
 xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">"#,
    );
    out.push_str("\n<Worksheet ss:Name=\"Sit-In Report\">\n<Table>\n");

    out.push_str("<Row>");
    for header in HEADERS {
        out.push_str(&format!(
            "<Cell><Data ss:Type=\"String\">{}</Data></Cell>",
            xml_escape(header)
        ));
    }
    out.push_str("</Row>\n");

    for record in records {
        out.push_str("<Row>");
        for field in row_fields(record) {
            out.push_str(&format!(
                "<Cell><Data ss:Type=\"String\">{}</Data></Cell>",
                xml_escape(&field)
            ));
        }
        out.push_str("</Row>\n");
    }

    out.push_str("</Table>\n</Worksheet>\n</Workbook>\n");
    out
}

/// Print-ready HTML report, served in place of a PDF renderer.
fn render_html(records: &[SitInRecord], range: &ReportRange) -> String {
    let mut out = String::new();
    out.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Sit-In Report</title>
<style>
body { font-family: Arial, sans-serif; margin: 2em; }
h1 { font-size: 1.4em; }
p.range { color: #555; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #999; padding: 6px 10px; text-align: left; }
th { background: #2c3e50; color: #fff; }
tr:nth-child(even) { background: #f2f2f2; }
</style>
</head>
<body>
<h1>Sit-In Report</h1>
"#,
    );
    if let Some(label) = range.label() {
        out.push_str(&format!("<p class=\"range\">{}</p>\n", xml_escape(&label)));
    }
    out.push_str("<table>\n<tr>");
    for header in HEADERS {
        out.push_str(&format!("<th>{}</th>", xml_escape(header)));
    }
    out.push_str("</tr>\n");

    for record in records {
        out.push_str("<tr>");
        for field in row_fields(record) {
            out.push_str(&format!("<td>{}</td>", xml_escape(&field)));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample_record() -> SitInRecord {
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .unwrap()
                .and_utc()
        };
        SitInRecord {
            id: 7,
            student_id: 12345,
            student_name: "Ana <Reyes>".to_string(),
            purpose: "Java Programming".to_string(),
            lab_id: 530,
            lab_name: "Laboratory 530".to_string(),
            login_time: parse("2024-03-15T10:00:00"),
            logout_time: Some(parse("2024-03-15T10:45:00")),
            status: "completed".to_string(),
            session_remaining: 30,
        }
    }

    #[test]
    fn unknown_format_key_is_rejected() {
        let err = ExportFormat::from_key("docx").unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedFormat(_)));
        assert!(ExportFormat::from_key("").is_err());
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ExportFormat::Csv.filename(), "sit_in_report.csv");
        assert_eq!(ExportFormat::Excel.content_type(), "application/vnd.ms-excel");
        assert_eq!(ExportFormat::Pdf.filename(), "sit_in_report.html");
    }

    #[test]
    fn csv_contains_header_and_duration() {
        let bytes = render(ExportFormat::Csv, &[sample_record()], &ReportRange::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("ID,Student ID,Student Name"));
        assert!(text.contains("Ana <Reyes>"));
        assert!(text.contains(",45,completed"));
    }

    #[test]
    fn csv_of_empty_set_is_header_only() {
        let bytes = render(ExportFormat::Csv, &[], &ReportRange::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn excel_is_escaped_spreadsheetml() {
        let bytes =
            render(ExportFormat::Excel, &[sample_record()], &ReportRange::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("urn:schemas-microsoft-com:office:spreadsheet"));
        assert!(text.contains("Ana &lt;Reyes&gt;"));
        assert!(!text.contains("Ana <Reyes>"));
    }

    #[test]
    fn html_report_escapes_cell_content() {
        let bytes = render(ExportFormat::Pdf, &[sample_record()], &ReportRange::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<table>"));
        assert!(text.contains("Ana &lt;Reyes&gt;"));
        // no range was requested, so no range line appears
        assert!(!text.contains("From:"));
    }

    #[test]
    fn html_report_echoes_the_date_range() {
        let range = ReportRange {
            from: Some("2024-03-01".to_string()),
            to: Some("2024-03-31".to_string()),
        };
        let bytes = render(ExportFormat::Pdf, &[sample_record()], &range).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("From: 2024-03-01 To: 2024-03-31"));
    }

    #[test]
    fn open_ended_range_labels_the_missing_bound() {
        let range = ReportRange {
            from: Some("2024-03-01".to_string()),
            to: None,
        };
        let bytes = render(ExportFormat::Pdf, &[], &range).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("From: 2024-03-01 To: today"));

        // delimited formats carry bare rows
        let csv = render(ExportFormat::Csv, &[], &range).unwrap();
        assert!(!String::from_utf8(csv).unwrap().contains("From:"));
    }
}
