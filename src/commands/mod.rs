//! Commands over one named disk.
//!
//! The VM is named after its disk. Observed states are: no disk, disk without VM,
//! VM stopped, VM running. Nothing is stored between invocations.

#[cfg(test)]
mod tests;

use chrono::{DateTime, Datelike, Local, TimeZone};

use crate::config::ResolvedSettings;
use crate::lifecycle::{DiskLifecycle, LifecycleError, LifecycleResult};

/// `{disk}-{year}-{month}-{day}-{epoch millis in hex}`; month and day are not zero-padded.
pub fn snapshot_name<Tz: TimeZone>(disk_name: &str, now: &DateTime<Tz>) -> String {
    format!(
        "{disk_name}-{}-{}-{}-{:x}",
        now.year(),
        now.month(),
        now.day(),
        now.timestamp_millis()
    )
}

/// Runs the orchestrated commands for `disk_name` with already-resolved settings.
pub struct DiskCommands {
    lifecycle: DiskLifecycle,
    disk_name: String,
    settings: ResolvedSettings,
}

impl DiskCommands {
    pub fn new(
        lifecycle: DiskLifecycle,
        disk_name: impl Into<String>,
        settings: ResolvedSettings,
    ) -> Self {
        Self {
            lifecycle,
            disk_name: disk_name.into(),
            settings,
        }
    }

    pub fn disk_name(&self) -> &str {
        &self.disk_name
    }

    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    /// Restore the disk if needed, create the VM on it, then start it.
    pub async fn launch(&self) -> LifecycleResult<()> {
        let zone = self.zone()?;
        tracing::debug!(
            disk = %self.disk_name,
            zone,
            machine_type = %self.settings.machine_type,
            options = ?self.settings.options,
            "Resolved launch settings"
        );

        tracing::info!(disk = %self.disk_name, zone, "Restoring disk if needed");
        self.lifecycle.restore_disk(&self.disk_name, zone).await?;

        self.lifecycle
            .create_machine(
                &self.disk_name,
                &self.disk_name,
                zone,
                &self.settings.machine_type,
                &self.settings.options,
            )
            .await?;

        self.resume().await
    }

    pub async fn resume(&self) -> LifecycleResult<()> {
        let zone = self.zone()?;
        self.lifecycle.start_machine(&self.disk_name, zone).await
    }

    pub async fn pause(&self) -> LifecycleResult<()> {
        let zone = self.zone()?;
        self.lifecycle.stop_machine(&self.disk_name, zone).await
    }

    /// Stop and delete the VM, then snapshot the disk it leaves behind.
    ///
    /// Returns the name of the new snapshot.
    pub async fn terminate(&self) -> LifecycleResult<String> {
        let zone = self.zone()?;
        let snapshot = snapshot_name(&self.disk_name, &Local::now());
        tracing::debug!(disk = %self.disk_name, zone, snapshot = %snapshot, "Terminating");

        self.pause().await?;
        self.lifecycle.delete_machine(&self.disk_name, zone).await?;
        self.lifecycle
            .create_snapshot(&self.disk_name, &snapshot, zone)
            .await?;
        Ok(snapshot)
    }

    pub async fn ip_address(&self) -> LifecycleResult<String> {
        let zone = self.zone()?;
        self.lifecycle.public_ip_address(&self.disk_name, zone).await
    }

    fn zone(&self) -> LifecycleResult<&str> {
        if self.settings.zone.is_empty() {
            return Err(LifecycleError::Config(format!(
                "no zone for disk '{}': pass --zone or set \"zone\" in its config file",
                self.disk_name
            )));
        }
        Ok(&self.settings.zone)
    }
}
