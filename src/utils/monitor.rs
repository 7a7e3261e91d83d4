#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

/// Samples CPU and memory of one child process while it runs.
#[cfg(feature = "cli")]
pub struct ProcessMonitor {
    system: System,
    pid: Pid,
    label: String,
    start_time: Instant,
    peak_memory: u64,
}

#[cfg(feature = "cli")]
impl ProcessMonitor {
    pub fn new(pid: u32, label: impl Into<String>) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
            label: label.into(),
            start_time: Instant::now(),
            peak_memory: 0,
        }
    }

    /// Returns `None` once the process is gone.
    pub fn sample(&mut self) -> Option<ProcessStats> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = self.system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        if memory_mb > self.peak_memory {
            self.peak_memory = memory_mb;
        }

        let stats = ProcessStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            peak_memory_mb: self.peak_memory,
            elapsed_time: self.start_time.elapsed(),
        };

        tracing::debug!(
            "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
            self.label,
            stats.cpu_usage,
            stats.memory_usage_mb,
            stats.peak_memory_mb
        );

        Some(stats)
    }

    pub fn log_final_stats(&self) {
        tracing::info!(
            "📊 {} - Total Time: {:?}, Peak Memory: {}MB",
            self.label,
            self.start_time.elapsed(),
            self.peak_memory
        );
    }
}

// No-op stand-in when built without the cli feature.
#[cfg(not(feature = "cli"))]
pub struct ProcessMonitor {
    label: String,
    start_time: Instant,
}

#[cfg(not(feature = "cli"))]
impl ProcessMonitor {
    pub fn new(_pid: u32, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start_time: Instant::now(),
        }
    }

    pub fn sample(&mut self) -> Option<ProcessStats> {
        None
    }

    pub fn log_final_stats(&self) {
        tracing::info!("📊 {} - Total Time: {:?}", self.label, self.start_time.elapsed());
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_sample_current_process() {
        let mut monitor = ProcessMonitor::new(std::process::id(), "self");
        let stats = monitor.sample().expect("current process is alive");
        assert_eq!(stats.peak_memory_mb, stats.memory_usage_mb);
    }

    #[test]
    fn test_sample_missing_process() {
        let mut monitor = ProcessMonitor::new(u32::MAX - 1, "ghost");
        assert!(monitor.sample().is_none());
    }
}
