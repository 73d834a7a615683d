use std::process::ExitCode;

use clap::Parser;
use s3_upload::cli::{normalize_legacy_flags, Args};
use s3_upload::{logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_from(normalize_legacy_flags(std::env::args_os()));
    logging::init(args.debug);

    ExitCode::from(run(args).await)
}
