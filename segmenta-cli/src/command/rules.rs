use segmenta_segments::DecisionTable;

pub(crate) fn run() -> anyhow::Result<()> {
    println!("{}", DecisionTable::builtin().to_json_pretty()?);
    Ok(())
}
