//! CLI entry point for `tgexport`.

use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use tgexport::config::Config;
use tgexport::export::naming::manifest_file_name;
use tgexport::export::{
    ExportMode, ExportOptions, ExportOrchestrator, JsonManifestWriter, ManifestOutcome,
    RunSummary,
};
use tgexport::filter::extension::ExtensionPolicy;
use tgexport::source::ArchiveSource;

#[derive(Parser)]
#[command(
    name = "tgexport",
    version,
    about = "Export the list of document files from a Telegram channel, or download them.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    export: ExportArgs,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct ExportArgs {
    /// Channel username, title or numeric id
    #[arg(short, long)]
    channel: Option<String>,

    /// Telegram Desktop export directory (or its result.json)
    #[arg(long, env = "TGEXPORT_ARCHIVE", value_name = "DIR")]
    archive: Option<PathBuf>,

    /// Public channel handle to use in post links
    #[arg(long, value_name = "HANDLE")]
    handle: Option<String>,

    /// Max number of channel messages to process [default: 100]
    #[arg(short, long)]
    max: Option<usize>,

    /// List attachments or download them [default: list]
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Directory to download files to [default: current dir]
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Size limit in MiB [default: 3072]
    #[arg(long, value_name = "MIB")]
    size_limit: Option<f64>,

    /// Allowed file extensions, case insensitive
    #[arg(long, num_args = 1.., value_name = "EXT")]
    extensions: Option<Vec<String>>,

    /// Do not write the JSON manifest
    #[arg(long)]
    no_output: bool,

    /// Directory for the JSON manifest [default: current dir]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    List,
    Download,
}

impl From<ModeArg> for ExportMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::List => ExportMode::List,
            ModeArg::Download => ExportMode::Download,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; problems are reported once logging is up
    let loaded = tgexport::config::load_config();
    let config = loaded.as_ref().ok().cloned().unwrap_or_default();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
    }

    match cli.command {
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => cmd_export(cli.export, &config).await,
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = tgexport::config::cache_dir(config);
    let log_file = tgexport::config::log_file_path(config);
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tgexport.log".into());
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "tgexport", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Merge command-line overrides into the configured run options.
fn build_options(args: &ExportArgs, config: &Config) -> anyhow::Result<ExportOptions> {
    let mut options = config.export_options();
    if let Some(exts) = &args.extensions {
        options.extensions = ExtensionPolicy::new(exts);
    }
    if let Some(limit) = args.size_limit {
        options.size_limit_mib = limit;
    }
    if let Some(max) = args.max {
        options.max_messages = max;
    }
    if let Some(mode) = args.mode {
        options.mode = mode.into();
    }
    if let Some(dir) = &args.download_dir {
        options.download_dir = dir.clone();
    }
    options.validate()?;
    Ok(options)
}

/// List or download the channel's attachments and write the manifest.
async fn cmd_export(args: ExportArgs, config: &Config) -> anyhow::Result<()> {
    let Some(channel) = args.channel.clone() else {
        anyhow::bail!("No channel given. Use --channel <CHANNEL>");
    };
    let Some(archive) = args.archive.clone() else {
        anyhow::bail!("No message source given. Use --archive <DIR> or set TGEXPORT_ARCHIVE");
    };
    if !archive.exists() {
        anyhow::bail!("Archive not found: {}", archive.display());
    }

    let options = build_options(&args, config)?;
    let max = options.max_messages;

    let write_manifest = config.export.write_manifest && !args.no_output;
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.export.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let manifest_path = output_dir.join(manifest_file_name(chrono::Utc::now(), &channel));

    let source = ArchiveSource::open(&archive)?.with_handle(args.handle.clone());
    let writer = JsonManifestWriter;
    let mut orchestrator = ExportOrchestrator::new(source, options);
    if write_manifest {
        orchestrator = orchestrator.with_writer(&writer, &manifest_path);
    }

    let pb = ProgressBar::new(max as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Processing [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let result = orchestrator
        .run(
            &channel,
            Some(&|current, total| {
                pb.set_length(total as u64);
                pb.set_position(current as u64);
            }),
        )
        .await;
    pb.finish_and_clear();

    let summary = result?;
    print_summary(&summary, orchestrator.options(), &archive);
    Ok(())
}

/// Print the run summary in a human-readable table.
fn print_summary(summary: &RunSummary, options: &ExportOptions, archive: &Path) {
    use humansize::{format_size, BINARY};

    let c = &summary.counters;
    println!();
    println!("  {:<25} {}", "Channel", summary.channel.display_name());
    println!("  {:<25} {}", "Source", archive.display());
    println!("  {:<25} {}", "Mode", options.mode);
    println!("  {:<25} {}", "Messages processed", c.messages_processed);
    if c.messages_skipped > 0 {
        println!("  {:<25} {}", "Messages unreadable", c.messages_skipped);
    }
    println!("  {:<25} {}", "Files found", summary.manifest.len());
    println!("  {:<25} {}", "Files skipped", c.attachments_rejected);
    if options.mode == ExportMode::Download {
        println!("  {:<25} {}", "Downloaded", c.files_downloaded);
        println!("  {:<25} {}", "Already present", c.files_existed);
        if c.transfers_failed > 0 {
            println!("  {:<25} {}", "Failed downloads", c.transfers_failed);
        }
        println!(
            "  {:<25} {}",
            "Downloaded size",
            format_size(c.bytes_downloaded, BINARY)
        );
        println!("  {:<25} {}", "Download directory", options.download_dir.display());
    }
    match &summary.manifest_outcome {
        ManifestOutcome::Written(path) => println!("  {:<25} {}", "Manifest", path.display()),
        ManifestOutcome::Failed(reason) => {
            println!("  {:<25} not written ({reason})", "Manifest")
        }
        ManifestOutcome::Skipped => {}
    }
    println!();
}
