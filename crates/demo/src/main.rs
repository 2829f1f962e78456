fn main() -> anyhow::Result<()> {
    let config = cinema_demo::DemoConfig::from_env()?;
    cinema_observability::init(&config.observability);

    let report = cinema_demo::run_scenario(&config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
