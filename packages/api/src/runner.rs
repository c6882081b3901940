//! Background crawl task plumbing.

use std::sync::Arc;
use std::time::Duration;

use crawler::{ChannelSink, ProgressEvent, ScrapeSession, SessionRunner};
use tokio::sync::mpsc;
use tracing::info;

use crate::registry::SessionRegistry;

/// Spawn the crawl for a freshly created session.
///
/// The caller registers the channel (and hands over its sender) before
/// spawning, so the stream endpoint can subscribe as soon as the create
/// response returns. After the crawl finishes the channel stays registered
/// for `stream_grace` so a late subscriber still observes the `end` event.
pub fn spawn_crawl(
    runner: Arc<SessionRunner>,
    registry: SessionRegistry,
    session: ScrapeSession,
    tx: mpsc::UnboundedSender<ProgressEvent>,
    stream_grace: Duration,
) {
    tokio::spawn(async move {
        let id = session.id;
        info!(session_id = %id, roots = session.root_urls.len(), "Crawl task starting");

        let sink = ChannelSink::new(tx.clone());
        runner.run(&session, &sink).await;

        let _ = tx.send(ProgressEvent::End {
            message: "Crawling finished".to_string(),
        });

        tokio::time::sleep(stream_grace).await;
        registry.close(id).await;
        info!(session_id = %id, "Crawl task finished");
    });
}
