use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::HistoryLog;

/// Periodically drops history rows whose `last_contact` is older than
/// `retention`. Stops when `stop` flips to `true` or its sender is dropped.
pub fn spawn_retention(
    history: Arc<dyn HistoryLog>,
    retention: Duration,
    every: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let cutoff = Utc::now().timestamp() - retention.as_secs() as i64;
            let history = history.clone();
            match tokio::task::spawn_blocking(move || history.prune_before(cutoff)).await {
                Ok(Ok(0)) => {}
                Ok(Ok(removed)) => log::info!("pruned {} history rows before {}", removed, cutoff),
                Ok(Err(e)) => log::warn!("history pruning failed: {}", e),
                Err(e) => log::warn!("history pruning task failed: {}", e),
            }
        }
        log::debug!("retention job stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::vector;
    use crate::state::Provenance;
    use crate::store::MemoryHistory;

    #[tokio::test]
    async fn prunes_on_first_tick_and_stops() {
        let history = Arc::new(MemoryHistory::new());
        let now = Utc::now().timestamp();
        let feed = Provenance::primary_feed();
        history.append(&vector("abc123", now - 7200, &feed)).unwrap();
        history.append(&vector("abc123", now, &feed)).unwrap();

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_retention(
            history.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            stop_rx,
        );

        for _ in 0..100 {
            if history.len().unwrap() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(history.len().unwrap(), 1);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
