mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cli::{Cli, Commands};
use mediaforge::{
    catalog,
    config::{self, Config},
    conversion::{ConversionExecutor, ConversionManager, ConversionSettings},
    scanner::Scanner,
};
use mf_av::{FfprobeInspector, FfmpegTranscoder, MediaInspector, Toolbox};
use mf_core::Classification;
use mf_db::pool::{get_conn, init_pool, DbPool};
use mf_db::queries::{attempts, jobs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults by verbosity.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaforge=debug,mf_av=debug,mf_db=debug".to_string()
        } else {
            "mediaforge=info,mf_av=info,mf_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { dir, kind } => cmd_scan(&config, &dir, kind.into()).await,
        Commands::Add { file, kind } => cmd_add(&config, &file, kind.into()).await,
        Commands::Run {
            directory,
            max_parallel,
        } => cmd_run(&config, directory.as_deref(), max_parallel).await,
        Commands::Convert { file } => cmd_convert(&config, &file).await,
        Commands::Probe { file, json } => cmd_probe(&config, &file, json).await,
        Commands::History { file } => cmd_history(&config, &file),
        Commands::CheckTools => cmd_check_tools(&config).await,
        Commands::Sweep => cmd_sweep(&config),
    }
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn open_store(config: &Config) -> Result<DbPool> {
    let db_path = config.storage.db_path.to_string_lossy();
    init_pool(&db_path).with_context(|| format!("Failed to open job store at {db_path}"))
}

fn build_inspector(config: &Config, toolbox: &Toolbox) -> Arc<dyn MediaInspector> {
    Arc::new(FfprobeInspector::new(
        toolbox.ffprobe.clone(),
        toolbox.ffmpeg.clone(),
        Duration::from_secs(config.tools.check_timeout_secs),
    ))
}

fn discover_toolbox(config: &Config) -> Result<Toolbox> {
    Toolbox::discover(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
    .context("External tools unavailable")
}

/// Cancel the token on SIGINT/SIGTERM so in-flight attempts can record
/// themselves interrupted at the next phase boundary.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("received interrupt, shutting down");
        }
        cancel.cancel();
    });
}

fn build_executor(config: &Config, pool: DbPool) -> Result<Arc<ConversionExecutor>> {
    let toolbox = discover_toolbox(config)?;
    let inspector = build_inspector(config, &toolbox);
    let transcoder = Arc::new(FfmpegTranscoder::new(toolbox.ffmpeg));
    let catalog = catalog::from_config(&config.catalog);
    Ok(Arc::new(ConversionExecutor::new(
        pool,
        inspector,
        transcoder,
        catalog,
        ConversionSettings::from_config(config),
    )))
}

/// Recovery sweep before dispatching any work: attempts left `converting`
/// by a crashed process become `interrupted`.
fn startup_sweep(pool: &DbPool) -> Result<()> {
    let conn = get_conn(pool)?;
    let swept = attempts::sweep_interrupted(&conn, &now_ts())?;
    if swept > 0 {
        info!("swept {swept} attempt(s) left over from a previous run");
    }
    Ok(())
}

async fn cmd_scan(config: &Config, dir: &Path, classification: Classification) -> Result<()> {
    anyhow::ensure!(dir.is_dir(), "Not a directory: {}", dir.display());

    let toolbox = discover_toolbox(config)?;
    let pool = open_store(config)?;
    let scanner = Scanner::new(pool, build_inspector(config, &toolbox));

    let report = scanner.scan_directory(dir, classification).await?;
    println!(
        "Scanned {}: {} added, {} already managed, {} unprobeable",
        dir.display(),
        report.added,
        report.skipped,
        report.failed
    );
    Ok(())
}

async fn cmd_add(config: &Config, file: &Path, classification: Classification) -> Result<()> {
    anyhow::ensure!(file.is_file(), "Not a file: {}", file.display());

    let toolbox = discover_toolbox(config)?;
    let pool = open_store(config)?;
    let scanner = Scanner::new(pool, build_inspector(config, &toolbox));

    if scanner.add_file(file, classification).await? {
        println!("Added {}", file.display());
    } else {
        println!("Already managed: {}", file.display());
    }
    Ok(())
}

async fn cmd_run(
    config: &Config,
    directory: Option<&Path>,
    max_parallel: Option<usize>,
) -> Result<()> {
    let pool = open_store(config)?;
    startup_sweep(&pool)?;

    let executor = build_executor(config, pool.clone())?;
    let min_streams = config.transcode.min_streams;

    let candidates = {
        let conn = get_conn(&pool)?;
        match directory {
            Some(dir) => {
                jobs::select_under_directory(&conn, &dir.to_string_lossy(), min_streams)?
            }
            None => jobs::select_candidates(&conn, min_streams)?,
        }
    };

    if candidates.is_empty() {
        println!("No candidate jobs.");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let manager = ConversionManager::new(
        executor,
        max_parallel.unwrap_or(config.conversion.max_parallel),
    );
    let summary = manager.run_all(candidates, cancel).await?;

    println!(
        "Run finished: {} done, {} errors, {} check-failed, {} interrupted, {} skipped",
        summary.done, summary.errors, summary.check_failed, summary.interrupted, summary.skipped
    );
    Ok(())
}

async fn cmd_convert(config: &Config, file: &Path) -> Result<()> {
    let pool = open_store(config)?;
    startup_sweep(&pool)?;

    let job = {
        let conn = get_conn(&pool)?;
        jobs::select_by_path(&conn, &file.to_string_lossy())?
    }
    .with_context(|| format!("Not managed: {} (run `add` first)", file.display()))?;

    let executor = build_executor(config, pool)?;
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let manager = ConversionManager::new(executor, 1);
    let summary = manager.run_all(vec![job], cancel).await?;

    if summary.done == 1 {
        println!("Converted {}", file.display());
    } else {
        println!(
            "Not converted: {} errors, {} check-failed, {} interrupted, {} skipped",
            summary.errors, summary.check_failed, summary.interrupted, summary.skipped
        );
    }
    Ok(())
}

async fn cmd_probe(config: &Config, file: &Path, json: bool) -> Result<()> {
    anyhow::ensure!(file.is_file(), "Not a file: {}", file.display());

    let toolbox = discover_toolbox(config)?;
    let inspector = build_inspector(config, &toolbox);
    let descriptor = inspector.probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    println!("File: {}", descriptor.path.display());
    println!("Streams: {}", descriptor.stream_count);
    println!("Size: {} bytes", descriptor.size_bytes);
    match descriptor.bit_rate {
        Some(rate) => println!("Bit rate: {rate} b/s"),
        None => println!("Bit rate: unknown"),
    }
    for stream in &descriptor.streams {
        let language = stream.language.as_deref().unwrap_or("und");
        let default = if stream.is_default { " [default]" } else { "" };
        println!(
            "  #{} {} {} ({}){}",
            stream.index, stream.codec_type, stream.codec_name, language, default
        );
    }
    Ok(())
}

fn cmd_history(config: &Config, file: &Path) -> Result<()> {
    let pool = open_store(config)?;
    let conn = get_conn(&pool)?;

    let job = jobs::select_by_path(&conn, &file.to_string_lossy())?
        .with_context(|| format!("Not managed: {}", file.display()))?;

    println!(
        "{} ({}, converted: {})",
        job.path, job.classification, job.converted
    );

    let history = attempts::list_for_job(&conn, job.id)?;
    if history.is_empty() {
        println!("  no attempts yet");
        return Ok(());
    }
    for attempt in history {
        let ended = attempt.ended_at.as_deref().unwrap_or("-");
        let detail = attempt.integrity.as_deref().unwrap_or("");
        println!(
            "  {} -> {}  {}  {}",
            attempt.started_at, ended, attempt.status, detail
        );
    }
    Ok(())
}

async fn cmd_check_tools(config: &Config) -> Result<()> {
    let infos = Toolbox::check_all(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
    .await;

    for info in infos {
        match (&info.path, &info.version) {
            (Some(path), Some(version)) => {
                println!("{}: {} ({})", info.name, path.display(), version)
            }
            (Some(path), None) => println!("{}: {} (version unknown)", info.name, path.display()),
            (None, _) => println!("{}: not found", info.name),
        }
    }
    Ok(())
}

fn cmd_sweep(config: &Config) -> Result<()> {
    let pool = open_store(config)?;
    let conn = get_conn(&pool)?;
    let swept = attempts::sweep_interrupted(&conn, &now_ts())?;
    println!("Swept {swept} attempt(s) to interrupted");
    Ok(())
}
