//! `segmenta`: segments the customers of a CSV file and writes the cluster profiles, the
//! cluster to segment mapping and the segment recommendations as CSV tables.

mod command;
mod report;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    command::run()
}
