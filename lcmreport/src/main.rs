use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use log::{error, info};

use lcmreport::config::{self, Prompter, TerminalPrompter};
use lcmreport::transport::HostKeyVerification;
use lcmreport::{
    Credentials, Fleet, Inventory, MailSettings, Notifier, PlatformRegistry, ReportSchema,
    RunContext, RunPaths, SmtpMailer, SshShell, TextFsmParser, XlsxReport,
};

#[derive(Parser)]
#[command(
    name = "lcmreport",
    version,
    about = "Collect lifecycle facts from network switches into an XLSX report"
)]
struct Cli {
    /// Device inventory
    #[arg(long, default_value = "devices.yml")]
    devices: PathBuf,

    /// Inventory key listing the devices to poll
    #[arg(long, default_value = "cisco")]
    group: String,

    /// Built-in schema name or path to a schema YAML file
    #[arg(long, default_value = "catalyst")]
    schema: String,

    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,

    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,

    #[arg(long, default_value = "LCM_REPORT_CISCO")]
    report_prefix: String,

    /// Per-device connect and command timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Refuse hosts missing from ~/.ssh/known_hosts
    #[arg(long)]
    strict_host_keys: bool,

    /// known_hosts file to check against instead of ~/.ssh/known_hosts
    #[arg(long, value_name = "FILE", requires = "strict_host_keys")]
    known_hosts: Option<PathBuf>,

    /// Mail the summary without asking
    #[arg(long, conflicts_with = "no_notify")]
    notify: bool,

    /// Print the summary without asking
    #[arg(long)]
    no_notify: bool,
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open run log {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} {} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let timestamp = RunContext::format_timestamp(Local::now());
    let paths = RunPaths::new(
        &cli.reports_dir,
        &cli.logs_dir,
        &cli.report_prefix,
        &timestamp,
    );
    init_logging(&paths.run_log)?;
    info!("Run {timestamp} started");

    let inventory = Inventory::load(&cli.devices, &cli.group)?;
    let schema = ReportSchema::resolve(&cli.schema)?;
    info!(
        "Loaded {} devices and schema '{}'",
        inventory.len(),
        schema.name
    );

    let mut prompter = TerminalPrompter;
    let credentials = Credentials::resolve(config::process_env, &mut prompter)?;

    let send_mail = if cli.notify {
        true
    } else if cli.no_notify {
        false
    } else {
        prompter.confirm("Do you want to send an email notification?")?
    };

    let subject = format!("LCM Report {}", schema.label());
    let notifier = if send_mail {
        let settings = MailSettings::from_lookup(config::process_env)?;
        Notifier::mail(SmtpMailer::new(&settings)?, &settings, subject)
    } else {
        Notifier::<SmtpMailer>::console(subject)
    };

    fs::create_dir_all(&paths.session_dir).with_context(|| {
        format!(
            "cannot create session log directory {}",
            paths.session_dir.display()
        )
    })?;
    let mut report = XlsxReport::create(&paths.report, &schema).inspect_err(|e| {
        error!("Cannot create report: {e}");
    })?;

    let context = RunContext::new(timestamp, credentials, paths);
    let verification = if cli.strict_host_keys {
        HostKeyVerification::Strict
    } else {
        HostKeyVerification::Disabled
    };
    let mut shell = SshShell::new(
        PlatformRegistry::with_builtin()?,
        Duration::from_secs(cli.timeout),
    )
    .with_host_key_verification(verification);
    if let Some(path) = cli.known_hosts {
        shell = shell.with_known_hosts(path);
    }
    let parser = TextFsmParser::with_builtin()?;

    let result = Fleet::new(&context, &shell, &parser, &schema)
        .run(&inventory, &mut report)
        .await;

    notifier.notify(&result).await;

    println!("Report written to {}", result.report_path.display());
    info!("Total execution time: {:.2?}", started.elapsed());
    Ok(())
}
