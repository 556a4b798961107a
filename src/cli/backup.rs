use std::{fmt::Display, process::ExitCode, sync::Arc};

use clap::builder::styling::AnsiColor;
use humantime::format_duration;
use log::{error, info};

use crate::{
    backup::Coordinator,
    config::JobConfig,
    error::Result,
    format::format_size,
    job::StrategyKind,
    mirror::RsyncRunner,
    report::{format_report, BackupReport, JobStatus},
    stats::CommandStats,
};

use super::args::{BackupArgs, GlobalArgs};

const EXIT_FAILED: u8 = 1;
const EXIT_NOT_ATTEMPTED: u8 = 2;

pub async fn main(cli: BackupArgs) -> Result<ExitCode> {
    let stats = CommandStats::new();
    let coordinator = Coordinator::new(Arc::new(RsyncRunner::new(&cli.rsync)));

    let report = match job_config(&cli) {
        Ok(config) => coordinator.run(&config, cli.settings()).await,
        Err(err) => BackupReport::not_attempted(&err, stats),
    };

    emit_report(&report, &cli.global)?;
    Ok(exit_code(&report))
}

fn job_config(cli: &BackupArgs) -> Result<JobConfig> {
    let file = match &cli.config_file {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::default(),
    };

    Ok(file.overlay(JobConfig::from_env()?).overlay(cli.job_config()))
}

fn emit_report(report: &BackupReport, args: &GlobalArgs) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(report)?;
        println!("{json}");
    } else {
        let text = format_report(report);
        match report.status {
            JobStatus::Succeeded => {
                let style = AnsiColor::Green.on_default();
                info!("{style}{text}{style:#}");
            }
            JobStatus::Failed | JobStatus::NotAttempted => error!("{text}"),
        }
    }

    if args.stats {
        print_stats(report);
    }

    Ok(())
}

fn print_stats(report: &BackupReport) {
    let stats = &report.stats;
    if report.strategy == Some(StrategyKind::S3) {
        print_stat("files uploaded", stats.files_uploaded);
        print_stat("files failed", stats.files_failed);
        if stats.files_skipped > 0 {
            print_stat("files skipped (dry run)", stats.files_skipped);
        }
        print_stat("bytes uploaded", format_size(stats.bytes_uploaded));
    }
    print_stat("elapsed time", format_duration(stats.elapsed_time()));
}

fn print_stat<T: Display>(name: &str, value: T) {
    let style = AnsiColor::BrightBlack.on_default();
    info!("{style}{name}:{style:#} {value}");
}

fn exit_code(report: &BackupReport) -> ExitCode {
    match report.status {
        JobStatus::Succeeded => ExitCode::SUCCESS,
        JobStatus::Failed => ExitCode::from(EXIT_FAILED),
        JobStatus::NotAttempted => ExitCode::from(EXIT_NOT_ATTEMPTED),
    }
}
