use anyhow::{bail, Result};
use autoinstaller_core::AppConfig;
use autoinstaller_panels::{fetch_catalog, PanelSession, ScriptEntry};

pub async fn run(config: AppConfig, name: Option<String>) -> Result<()> {
    let session = PanelSession::new(&config.http)?;
    let catalog = fetch_catalog(&session, &config.catalog).await?;

    if let Some(name) = name {
        match catalog.find_by_name(&name) {
            Some(script) => print_entry(script),
            None => bail!("no script named '{}' in the catalog", name.trim()),
        }
        return Ok(());
    }

    println!("{} scripts:\n", catalog.len());
    for script in catalog.scripts() {
        print_entry(script);
    }
    Ok(())
}

fn print_entry(script: &ScriptEntry) {
    println!(
        "  {:>5}  {:<32} {:<6} {}",
        script.sid,
        script.name.trim(),
        script.kind.action(),
        script.category.as_deref().unwrap_or("-")
    );
}
