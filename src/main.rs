#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pluralskill::run().await {
        eprintln!("pluralskill fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
