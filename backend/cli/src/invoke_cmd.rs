//! `appbridge invoke`: handle one serverless proxy event.

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use appbridge_dispatch::Dispatcher;
use appbridge_gateway::{invoke, router, ProxyRequest};

/// Read a proxy event from stdin and write the proxy response to stdout.
pub async fn run(dispatcher: Dispatcher) -> Result<()> {
    let mut raw = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut raw)
        .await
        .context("failed to read proxy event from stdin")?;
    let event: ProxyRequest =
        serde_json::from_slice(&raw).context("stdin is not a proxy event")?;

    let response = invoke(router(dispatcher), event).await?;

    let mut out = serde_json::to_vec(&response)?;
    out.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&out).await?;
    stdout.flush().await?;
    Ok(())
}
