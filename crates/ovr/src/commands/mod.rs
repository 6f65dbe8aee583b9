pub mod completions;
pub mod export_report;
pub mod list_reports;
pub mod report_formats;
