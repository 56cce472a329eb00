// LinkTerm - interactive line terminal for serial and TCP links
use clap::Parser;
use linkterm::cli::{execute_command, Args};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    execute_command(args).await.into()
}
