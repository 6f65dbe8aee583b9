use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use log::info;
use ovr_gmp::{ReportId, Session};

#[derive(Clone, Debug, clap::Parser)]
pub struct ExportReportCommand {
    /// Id of the report to download
    report_id: String,
    /// Write the report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportReportCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let Self { report_id, output } = self;
        let body = session.fetch_report(&ReportId::new(report_id)).await?;
        match output {
            Some(path) => {
                fs::write(&path, &body).with_context(|| format!("Failed to write {path:?}"))?;
                info!("Wrote {} bytes to {path:?}", body.len());
            }
            None => io::stdout()
                .write_all(&body)
                .context("Failed to write to stdout")?,
        }
        Ok(())
    }
}
