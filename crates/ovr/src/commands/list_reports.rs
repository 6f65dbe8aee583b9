use ovr_gmp::{ReportId, ReportSummary, Session};

#[derive(Clone, Debug, clap::Parser)]
pub struct ListReportsCommand {
    /// Print the listing as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ListReportsCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let reports = session.list_reports().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
            return Ok(());
        }
        let mut table = Table::new();
        for (id, summary) in &reports {
            table.push(id, summary);
        }
        table.pretty_print();
        Ok(())
    }
}

const HEADERS: [&str; 9] = [
    "ID", "NAME", "HOSTS", "VULNS", "HIGH", "MEDIUM", "LOW", "LOG", "SEVERITY",
];

struct Table {
    columns: [Vec<String>; 9],
}

impl Table {
    fn new() -> Self {
        Self {
            columns: HEADERS.map(|h| vec![h.to_string()]),
        }
    }

    fn push(&mut self, id: &ReportId, summary: &ReportSummary) {
        let ReportSummary {
            name,
            hosts,
            vulns,
            high,
            medium,
            low,
            log,
            severity,
        } = summary;
        let row = [
            id.to_string(),
            name.clone(),
            hosts.to_string(),
            vulns.to_string(),
            high.to_string(),
            medium.to_string(),
            low.to_string(),
            log.to_string(),
            severity.to_string(),
        ];
        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    fn pretty_print(self) {
        let widths = self
            .columns
            .iter()
            .map(|column| 1 + column.iter().map(|cell| cell.len()).max().unwrap_or(0))
            .collect::<Vec<_>>();
        for row in 0..self.columns[0].len() {
            let mut line = String::new();
            for (column, width) in self.columns.iter().zip(widths.iter().copied()) {
                line.push_str(&format!("{:width$}", column[row]));
            }
            println!("{}", line.trim_end());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_column_grows_by_one_per_report() {
        let mut table = Table::new();
        table.push(
            &ReportId::new("r-aaa"),
            &ReportSummary {
                name: "weekly scan".to_string(),
                hosts: 3,
                vulns: 12,
                high: 2,
                medium: 4,
                low: 6,
                log: 20,
                severity: 9.8,
            },
        );
        assert!(table.columns.iter().all(|column| column.len() == 2));
    }
}
