//! `aigentd seed` — Load a JSON fixture into the store.

use aigentd_config::seed::{apply, SeedData};
use aigentd_config::AppConfig;
use std::path::PathBuf;

pub async fn run(
    config: AppConfig,
    fixture: PathBuf,
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::build_store(&config).await?;
    let data = SeedData::load(&fixture)?;

    let written = apply(&data, store.as_ref(), &config.model.default_endpoint, overwrite).await?;
    println!("Seeded {written} record(s) from {}", fixture.display());

    Ok(())
}
