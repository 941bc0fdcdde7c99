#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pluralskill::run_worker().await {
        eprintln!("pluralskill-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
