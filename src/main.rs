use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use linelist_dedup::cli::Cli;
use linelist_dedup::export::{OutputPaths, export_run};
use linelist_dedup::orchestrator::ProgressUpdate;
use linelist_dedup::run_with_progress;
use linelist_dedup::source::load_csv_table;
use linelist_dedup::util::envfile::load_dotenv_if_present;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn log_progress(u: ProgressUpdate) {
    info!(
        "[{}] {}/{} ({:.1}%) elapsed {:.1}s | mem used {} MB, avail {} MB",
        u.stage,
        u.processed,
        u.total,
        u.percent,
        u.elapsed.as_secs_f32(),
        u.mem_used_mb,
        u.mem_avail_mb
    );
}

fn run() -> Result<()> {
    load_dotenv_if_present()?;
    let cli = Cli::parse();

    let yearly = load_csv_table(&cli.yearly)?;
    let daily = load_csv_table(&cli.daily)?;

    if cli.list_columns {
        for (label, table) in [("yearly", &yearly), ("daily", &daily)] {
            println!("{} ({}):", label, table.len());
            for (i, c) in table.columns.iter().enumerate() {
                println!("  {:>3}  {}", i, c);
            }
        }
        return Ok(());
    }

    let roles = cli.column_roles()?;
    let cfg = cli.match_config()?;
    info!(
        "Matching {} daily against {} yearly records; policy {}, block key {} digits",
        daily.len(),
        yearly.len(),
        cfg.policy,
        cfg.block_key_len
    );

    let report = run_with_progress(&yearly, &daily, &roles, &cfg, log_progress)?;
    report.summary.log();

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating output dir {}", cli.out_dir.display()))?;
    let paths = OutputPaths::for_date(&cli.out_dir, cli.run_date());
    export_run(&paths, &daily, &report.result, &report.summary).context("writing outputs")?;

    info!("Duplicates: {}", paths.duplicates.display());
    info!("New records: {}", paths.new_records.display());
    info!("Audit: {}", paths.audit.display());
    info!("Summary: {}", paths.summary.display());
    Ok(())
}
