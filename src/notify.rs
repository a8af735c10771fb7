use anyhow::Result;

pub fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("edit-copy")
        .appname("utmkit")
        .show()?;
    Ok(())
}

/// Notify, logging instead of failing
pub fn notify_quiet(summary: &str, body: &str) {
    if let Err(e) = notify(summary, body) {
        tracing::warn!("Desktop notification failed: {}", e);
    }
}
