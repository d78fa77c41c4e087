use sysinfo::{Disks, System};

use crate::models::HostSample;

/// Samples the machine the console runs on. CPU usage is a delta between
/// refreshes, so the same `System` is kept across calls.
pub struct HostProbe {
    system: System,
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }

    pub fn sample(&mut self) -> HostSample {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu = f64::from(self.system.global_cpu_usage());
        let memory = percent(self.system.used_memory(), self.system.total_memory());

        let disks = Disks::new_with_refreshed_list();
        let (total, available) = disks.list().iter().fold((0u64, 0u64), |(t, a), d| {
            (t + d.total_space(), a + d.available_space())
        });
        let disk = percent(total.saturating_sub(available), total);

        HostSample { cpu, memory, disk }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_empty_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(25, 100), 25.0);
    }

    #[test]
    fn sample_stays_in_range() {
        let mut probe = HostProbe::new();
        let s = probe.sample();
        assert!((0.0..=100.0).contains(&s.memory));
        assert!((0.0..=100.0).contains(&s.disk));
        assert!(s.cpu >= 0.0);
    }
}
