mod args;
mod backup;
mod parse;

use std::process::ExitCode;

use clap::{
    builder::styling::{AnsiColor, Styles},
    Parser, Subcommand,
};
use concolor_clap::ColorChoice;
use env_logger::WriteStyle;
use log::error;

use crate::logger;

use self::args::{BackupArgs, GlobalArgs};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, propagate_version = true, styles = cli_styles())]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up a directory to a remote host or an object store
    Backup(BackupArgs),
}

impl Command {
    fn global(&self) -> &GlobalArgs {
        match self {
            Command::Backup(args) => &args.global,
        }
    }
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.command.global());

    let result = match cli.command {
        Command::Backup(args) => backup::main(args).await,
    };

    result.unwrap_or_else(|err| {
        error!("{err}");
        ExitCode::FAILURE
    })
}

fn init_logger(args: &GlobalArgs) {
    let logger = &args.logger;
    let style = match logger.color {
        ColorChoice::Always => WriteStyle::Always,
        ColorChoice::Never => WriteStyle::Never,
        _ => WriteStyle::Auto,
    };
    logger::init(logger.verbose, logger.quiet, style);
}

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default())
        .usage(AnsiColor::BrightMagenta.on_default())
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightCyan.on_default())
}
