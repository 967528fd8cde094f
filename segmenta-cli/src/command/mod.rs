use clap::{Parser, Subcommand};

use self::{generate::GenerateArg, run::RunArg};

mod generate;
mod rules;
mod run;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Segment the customers of a CSV file
    Run(#[clap(flatten)] RunArg),
    /// Write a synthetic customer table
    Generate(#[clap(flatten)] GenerateArg),
    /// Print the built-in decision table as JSON
    Rules,
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Run(arg) => run::run(&arg)?,
        Mode::Generate(arg) => generate::run(&arg)?,
        Mode::Rules => rules::run()?,
    }
    Ok(())
}
