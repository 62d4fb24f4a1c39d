use serde::{Deserialize, Serialize};

use super::counters::{
    Aggregation64, FileStat, ResourceCategories, SyscallErrors, TimeCategories,
    TransactionCategories,
};
use super::protocols::{AppInfo, Proto};

/// Execution identity of a program's main thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessDetails {
    pub comm: String,
    pub exe: String,
    pub args: Vec<String>,
    pub container_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessInfo {
    pub details: Option<ProcessDetails>,
    pub resource_counters: Option<ResourceCategories>,
    pub tcounters: Option<TimeCategories>,
    pub transaction_counters: Option<TransactionCategories>,
    pub protos: Option<Proto>,
    pub syscall_errors: Option<SyscallErrors>,
    pub top_files: Vec<FileStat>,
    pub top_devices: Vec<FileStat>,
    pub app: Option<AppInfo>,
}

/// A group of processes sharing one execution identity.
///
/// In a raw snapshot `pid` is the main process id. Once aggregated it holds
/// the program identity hash, which is also the program's primary key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Program {
    pub pid: u64,
    /// Raw process ids belonging to this program.
    pub pids: Vec<u64>,
    pub uids: Vec<u32>,
    pub environment_hash: String,
    /// Reporting groups this program is pinned to; protects it from limiting.
    pub program_reporting_group_ids: Vec<u32>,
    /// Bitmask of client/server/local roles.
    pub netrole: u32,
    pub procinfo: Option<ProcessInfo>,
    pub start_count: Option<u64>,
    pub aggr_start_count: Option<Aggregation64>,
    pub count_processes: Option<u64>,
    pub aggr_count_processes: Option<Aggregation64>,
}

impl Program {
    /// Resource counters, if the program reported any.
    pub fn resource_counters(&self) -> Option<&ResourceCategories> {
        self.procinfo.as_ref()?.resource_counters.as_ref()
    }
}

/// One executed command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDetails {
    pub timestamp: u64,
    pub count: Option<u64>,
    pub aggr_count: Option<Aggregation64>,
    pub comm: String,
    pub pid: u64,
    pub ppid: u64,
    pub uid: u32,
    pub cwd: String,
    pub cmdline: String,
    pub login_shell_id: u64,
    /// Hops from the login shell; `Some(0)` is the shell itself.
    pub login_shell_distance: Option<u32>,
    pub tty: u32,
    pub category: u32,
    pub container_id: String,
}
