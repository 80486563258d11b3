use anyhow::Result;

use crate::commands::{CommandReport, start_extension};

pub async fn set_key(api_key: &str) -> Result<CommandReport> {
    let mut report = CommandReport::new("set-key");
    if api_key.trim().is_empty() {
        report.issue("API key is blank; use clear-key to remove the stored key");
        return Ok(report);
    }
    save(&mut report, Some(api_key)).await?;
    Ok(report)
}

pub async fn clear_key() -> Result<CommandReport> {
    let mut report = CommandReport::new("clear-key");
    save(&mut report, None).await?;
    Ok(report)
}

async fn save(report: &mut CommandReport, api_key: Option<&str>) -> Result<()> {
    let ext = start_extension()?;
    let surface = ext.surface();

    let acknowledged = surface.save_api_key(api_key).await?;
    if !acknowledged {
        report.issue("broker did not acknowledge the new key");
    }
    let status = surface.status()?;
    report.detail(format!(
        "api_key={}",
        status.api_key.as_deref().unwrap_or("<not set>")
    ));

    ext.shutdown();
    Ok(())
}
