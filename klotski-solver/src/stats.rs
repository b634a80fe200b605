//! Search statistics tracking.

use std::time::Instant;

use log::info;

/// Get current process memory usage in bytes (RSS - Resident Set Size).
/// Returns None if unable to determine.
#[cfg(target_os = "macos")]
pub fn get_memory_usage() -> Option<u64> {
    use std::mem::MaybeUninit;

    // macOS: use mach APIs
    extern "C" {
        fn mach_task_self() -> u32;
        fn task_info(
            target_task: u32,
            flavor: i32,
            task_info_out: *mut libc::c_void,
            task_info_outCnt: *mut u32,
        ) -> i32;
    }

    #[repr(C)]
    struct TaskBasicInfo {
        suspend_count: i32,
        virtual_size: u64,
        resident_size: u64,
        user_time: (i32, i32),
        system_time: (i32, i32),
        policy: i32,
    }

    const TASK_BASIC_INFO_64: i32 = 5;
    const TASK_BASIC_INFO_64_COUNT: u32 = 10;

    unsafe {
        let mut info = MaybeUninit::<TaskBasicInfo>::uninit();
        let mut count = TASK_BASIC_INFO_64_COUNT;

        let result = task_info(
            mach_task_self(),
            TASK_BASIC_INFO_64,
            info.as_mut_ptr() as *mut libc::c_void,
            &mut count,
        );

        if result == 0 {
            Some(info.assume_init().resident_size)
        } else {
            None
        }
    }
}

#[cfg(target_os = "linux")]
pub fn get_memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn get_memory_usage() -> Option<u64> {
    None
}

/// Format bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format whole seconds as hh:mm:ss.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Statistics collected during a search.
#[derive(Debug, Default)]
pub struct SearchStats {
    /// States dequeued and expanded
    pub expanded: u64,

    /// Distinct states recorded in the predecessor map
    pub discovered: u64,

    /// Successors dropped because their key was already recorded
    pub duplicates: u64,

    /// Largest frontier length seen
    pub max_frontier: usize,

    /// Depth of the most recently expanded state
    pub depth: u32,

    /// States discovered at each depth (index = moves from start)
    pub layers: Vec<u64>,

    /// For rate calculation
    start_time: Option<Instant>,
    last_log_time: Option<Instant>,
    last_log_expanded: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            last_log_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Record a newly discovered state at the given depth.
    pub fn record_discovered(&mut self, depth: u32) {
        self.discovered += 1;
        let depth = depth as usize;
        if self.layers.len() <= depth {
            self.layers.resize(depth + 1, 0);
        }
        self.layers[depth] += 1;
    }

    /// Record one expansion and the frontier length after it.
    pub fn record_expanded(&mut self, depth: u32, frontier_len: usize) {
        self.expanded += 1;
        self.depth = depth;
        self.max_frontier = self.max_frontier.max(frontier_len);
    }

    /// Seconds since the search started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0)
    }

    /// Get current expansions per second
    pub fn states_per_sec(&self) -> f64 {
        let elapsed = self.elapsed_secs();
        if elapsed > 0.0 {
            self.expanded as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        if let Some(last) = self.last_log_time {
            last.elapsed().as_secs() >= interval_secs
        } else {
            true
        }
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self, frontier_len: usize) {
        let now = Instant::now();

        // Rate since last log
        let rate = if let Some(last) = self.last_log_time {
            let elapsed = last.elapsed().as_secs_f64();
            let expanded = self.expanded - self.last_log_expanded;
            if elapsed > 0.0 {
                expanded as f64 / elapsed
            } else {
                0.0
            }
        } else {
            self.states_per_sec()
        };

        let mem_str = get_memory_usage()
            .map(|m| format!(" mem={}", format_bytes(m)))
            .unwrap_or_default();

        info!(
            "[{}] expanded={} discovered={} frontier={} depth={} rate={:.0}/s{}",
            format_elapsed(self.elapsed_secs() as u64),
            self.expanded,
            self.discovered,
            frontier_len,
            self.depth,
            rate,
            mem_str,
        );

        self.last_log_time = Some(now);
        self.last_log_expanded = self.expanded;
    }

    /// Print final summary
    pub fn print_summary(&self) {
        println!("States expanded: {}", self.expanded);
        println!("States discovered: {}", self.discovered);
        println!("Duplicate successors: {}", self.duplicates);
        println!("Max frontier: {}", self.max_frontier);
        println!("Depth reached: {}", self.depth);

        let elapsed = self.elapsed_secs();
        if elapsed > 0.0 {
            println!("Average rate: {:.0} states/sec", self.expanded as f64 / elapsed);
        }
        if let Some(mem) = get_memory_usage() {
            println!("Memory: {}", format_bytes(mem));
        }
    }
}
