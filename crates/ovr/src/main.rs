#![forbid(unsafe_code)]

mod commands;
mod logger;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use ovr_gmp::{Client, Credentials, Error, Password, Scheme, Session};
use url::Host;

use crate::commands::{
    completions::CompletionsCommand, export_report::ExportReportCommand,
    list_reports::ListReportsCommand, report_formats::ReportFormatsCommand,
};

#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Log request and response details
    #[clap(long, env = "OPENVAS_DEBUG")]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ConnectionArgs {
    /// Hostname or IP of the scanner's web interface
    #[clap(long, env = "OPENVAS_HOST")]
    host: Option<String>,
    /// Port of the scanner's web interface
    #[clap(long, env = "OPENVAS_PORT")]
    port: Option<u16>,
    /// Connect over plain HTTP instead of HTTPS
    #[clap(long, env = "OPENVAS_PLAIN")]
    plain: bool,
    /// Accept the scanner's self-signed certificate
    #[clap(long, env = "OPENVAS_SELF_SIGNED")]
    self_signed: bool,
    /// Username for the basic-auth layer in front of the web interface
    #[clap(long, env = "OPENVAS_BASIC_AUTH_USER")]
    basic_auth_user: Option<String>,
    #[clap(long, env = "OPENVAS_BASIC_AUTH_PASS", hide_env_values = true)]
    basic_auth_pass: Option<String>,
    /// Scanner application login
    #[clap(long, env = "OPENVAS_USERNAME")]
    username: Option<String>,
    #[clap(long, env = "OPENVAS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl ConnectionArgs {
    async fn open(self) -> anyhow::Result<Session> {
        let Self {
            host,
            port,
            plain,
            self_signed,
            basic_auth_user,
            basic_auth_pass,
            username,
            password,
        } = self;
        let host = host.ok_or_else(|| anyhow!("No scanner host; pass --host or set OPENVAS_HOST"))?;
        let host = Host::parse(&host)?;
        let basic_auth_user =
            basic_auth_user.ok_or(Error::CredentialsMissing("OPENVAS_BASIC_AUTH_USER"))?;
        let basic_auth_pass =
            basic_auth_pass.ok_or(Error::CredentialsMissing("OPENVAS_BASIC_AUTH_PASS"))?;
        let username = username.ok_or(Error::CredentialsMissing("OPENVAS_USERNAME"))?;
        let password = password.ok_or(Error::CredentialsMissing("OPENVAS_PASSWORD"))?;

        let mut builder = Client::builder(host)
            .port(port)
            .basic_authentication(&basic_auth_user, &Password::new(basic_auth_pass));
        if self_signed {
            builder = builder.with_inner(|b| b.danger_accept_invalid_certs(true));
        }
        let scheme = if plain { Scheme::Plain } else { Scheme::Secure };
        let client = builder.build_with_scheme(scheme)?;

        Ok(Session::open(client, &Credentials::new(username, password)).await?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the most recent scan reports
    List(ListReportsCommand),
    /// Download one report rendered as CSV results
    Export(ExportReportCommand),
    /// Print the discovered report format ids
    Formats(ReportFormatsCommand),
    /// Print a completion file for the given shell.
    ///
    /// Example: `ovr completions zsh | source /dev/stdin`.
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn exec(self) -> anyhow::Result<()> {
        let Self {
            connection,
            debug: _,
            command,
        } = self;
        match command {
            Commands::List(cmd) => cmd.exec(connection.open().await?).await?,
            Commands::Export(cmd) => cmd.exec(connection.open().await?).await?,
            Commands::Formats(cmd) => cmd.exec(connection.open().await?).await?,
            Commands::Completions(cmd) => cmd.exec::<Self>()?,
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.debug);
    cli.exec().await
}
