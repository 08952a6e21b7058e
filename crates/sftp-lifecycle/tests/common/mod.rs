#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sftp_lifecycle::{FixedClock, LifecycleConfig, Provisioner, Reaper};
use std::sync::Arc;
use transfer_backend::InMemoryTransfer;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn config() -> LifecycleConfig {
    LifecycleConfig::new(
        "us-east-1".parse().unwrap(),
        "arn:aws:iam::123456789012:role/sftp-logging".parse().unwrap(),
        "arn:aws:iam::123456789012:role/sftp-user".parse().unwrap(),
        "customer-drop".parse().unwrap(),
    )
}

pub struct Harness {
    pub transfer: Arc<InMemoryTransfer>,
    pub clock: Arc<FixedClock>,
    pub provisioner: Provisioner,
    pub reaper: Reaper,
}

pub fn harness_with(config: LifecycleConfig) -> Harness {
    let transfer = Arc::new(InMemoryTransfer::new("us-east-1"));
    let clock = Arc::new(FixedClock::new(now()));
    let config = Arc::new(config);

    let provisioner =
        Provisioner::new(transfer.clone(), config.clone()).with_clock(clock.clone());
    let reaper = Reaper::new(transfer.clone(), config).with_clock(clock.clone());

    Harness {
        transfer,
        clock,
        provisioner,
        reaper,
    }
}

pub fn harness() -> Harness {
    harness_with(config())
}
