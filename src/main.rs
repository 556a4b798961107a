use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    offsite::cli::main().await
}
