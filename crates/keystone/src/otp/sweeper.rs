//! Background reclamation of expired verification records.

use std::sync::Arc;
use std::time::Duration;

use super::OtpManager;

/// Background worker that periodically sweeps the OTP store.
///
/// Purely a memory bound: expiry is enforced inside `verify` regardless of
/// when this runs.
pub async fn sweeper_worker(
    otp: Arc<OtpManager>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tracing::info!(interval = ?interval, "🧹 OTP sweeper started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let removed = otp.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = otp.active_records(), "Swept expired verification records");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("🧹 OTP sweeper shutting down...");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::{FixedCodes, ManualClock, OtpPolicy};
    use chrono::TimeDelta;
    use keystone_common::Channel;

    #[tokio::test(start_paused = true)]
    async fn test_worker_sweeps_on_interval_and_stops() {
        let clock = Arc::new(ManualClock::fixed());
        let otp = Arc::new(OtpManager::new(
            OtpPolicy::default(),
            clock.clone(),
            Arc::new(FixedCodes::new(&["111111", "222222"])),
        ));
        otp.issue(Channel::Email, "stale@x.com").unwrap();
        otp.issue(Channel::Phone, "+15550100200").unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
        let interval = Duration::from_secs(600);
        let worker = tokio::spawn(sweeper_worker(otp.clone(), interval, shutdown_rx));

        // Records are long past expiry + grace, but nothing runs before the tick
        clock.advance(TimeDelta::minutes(10));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(otp.active_records(), 2);

        tokio::time::sleep(interval).await;
        assert_eq!(otp.active_records(), 0);
        assert_eq!(otp.get_stats().swept, 2);

        shutdown_tx.send(()).unwrap();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_keeps_live_records() {
        let clock = Arc::new(ManualClock::fixed());
        let otp = Arc::new(OtpManager::new(
            OtpPolicy::default(),
            clock.clone(),
            Arc::new(FixedCodes::new(&["111111"])),
        ));
        otp.issue(Channel::Email, "live@x.com").unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
        let worker = tokio::spawn(sweeper_worker(
            otp.clone(),
            Duration::from_secs(10),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(otp.active_records(), 1);

        drop(shutdown_tx);
        worker.await.unwrap();
    }
}
