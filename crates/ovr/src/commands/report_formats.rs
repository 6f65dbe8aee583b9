use ovr_gmp::Session;

#[derive(Clone, Debug, clap::Parser)]
pub struct ReportFormatsCommand;

impl ReportFormatsCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let formats = session.report_formats();
        println!("XML          {}", formats.xml);
        println!("CSV Results  {}", formats.csv);
        Ok(())
    }
}
