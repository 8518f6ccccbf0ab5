use anyhow::Context;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "quadra.ron";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    quadra::launch(&config_path)
        .with_context(|| format!("quadra exited with an error (config: {})", config_path.display()))?;

    tracing::info!(target: "quadra::core", "Goodbye");
    Ok(())
}
