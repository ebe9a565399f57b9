use clap::Parser;

mod cli;

use cli::op::{Op, OpContext};
use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    let ctx = OpContext {
        config_path: args.config_path,
    };

    let result = match args.command {
        Command::Init(op) => run(&op, &ctx).await,
        Command::Daemon(op) => run(&op, &ctx).await,
        Command::Version(op) => run(&op, &ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run<O: Op>(op: &O, ctx: &OpContext) -> anyhow::Result<()> {
    let output = op.execute(ctx).await?;
    println!("{}", output);
    Ok(())
}
