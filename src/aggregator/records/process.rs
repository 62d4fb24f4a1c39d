use crate::aggregator::field::{
    bit_or, fold_counter, replace_list_if_nonempty, replace_opt, replace_value, union,
};
use crate::aggregator::hash::program_identity;
use crate::aggregator::key::{merge_repeated, merge_singleton};
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::process::{CommandDetails, ProcessDetails, ProcessInfo, Program};

impl Program {
    /// Stable identity of this program's execution context.
    ///
    /// Missing process details hash as empty strings and an empty argument
    /// list.
    pub fn identity(&self) -> u64 {
        let details = self
            .procinfo
            .as_ref()
            .and_then(|info| info.details.as_ref());
        match details {
            Some(d) => program_identity(
                &d.comm,
                &d.exe,
                &d.args,
                &d.container_id,
                &self.environment_hash,
            ),
            None => program_identity::<&str>("", "", &[], "", &self.environment_hash),
        }
    }
}

impl Aggregate for ProcessDetails {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.comm, input.comm);
        replace_value(&mut self.exe, input.exe);
        replace_list_if_nonempty(&mut self.args, input.args);
        replace_value(&mut self.container_id, input.container_id);
    }
}

impl Aggregate for ProcessInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.details, input.details, stats);
        merge_singleton(&mut self.resource_counters, input.resource_counters, stats);
        merge_singleton(&mut self.tcounters, input.tcounters, stats);
        merge_singleton(
            &mut self.transaction_counters,
            input.transaction_counters,
            stats,
        );
        merge_singleton(&mut self.protos, input.protos, stats);
        merge_singleton(&mut self.syscall_errors, input.syscall_errors, stats);
        merge_repeated(&mut self.top_files, input.top_files, stats);
        merge_repeated(&mut self.top_devices, input.top_devices, stats);
        merge_singleton(&mut self.app, input.app, stats);
    }
}

impl Aggregate for Program {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.pid, input.pid);
        union(&mut self.pids, input.pids);
        union(&mut self.uids, input.uids);
        replace_value(&mut self.environment_hash, input.environment_hash);
        union(
            &mut self.program_reporting_group_ids,
            input.program_reporting_group_ids,
        );
        bit_or(&mut self.netrole, input.netrole);
        merge_singleton(&mut self.procinfo, input.procinfo, stats);
        fold_counter(&mut self.aggr_start_count, input.start_count);
        fold_counter(&mut self.aggr_count_processes, input.count_processes);
    }
}

impl Aggregate for CommandDetails {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.timestamp, input.timestamp);
        fold_counter(&mut self.aggr_count, input.count);
        replace_value(&mut self.comm, input.comm);
        replace_value(&mut self.pid, input.pid);
        replace_value(&mut self.ppid, input.ppid);
        replace_value(&mut self.uid, input.uid);
        replace_value(&mut self.cwd, input.cwd);
        replace_value(&mut self.cmdline, input.cmdline);
        replace_value(&mut self.login_shell_id, input.login_shell_id);
        replace_opt(&mut self.login_shell_distance, input.login_shell_distance);
        replace_value(&mut self.tty, input.tty);
        replace_value(&mut self.category, input.category);
        replace_value(&mut self.container_id, input.container_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::counters::{FileStat, ResourceCategories};

    fn program(comm: &str, exe: &str, args: &[&str], pids: &[u64]) -> Program {
        Program {
            pid: pids.first().copied().unwrap_or_default(),
            pids: pids.to_vec(),
            procinfo: Some(ProcessInfo {
                details: Some(ProcessDetails {
                    comm: comm.to_string(),
                    exe: exe.to_string(),
                    args: args.iter().map(|s| s.to_string()).collect(),
                    container_id: String::new(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_matches_reference() {
        let nginx = program("nginx", "/usr/sbin/nginx", &["-g", "daemon off;"], &[10]);
        assert_eq!(nginx.identity(), 18_446_744_073_513_338_962);
    }

    #[test]
    fn test_identity_ignores_pids() {
        let a = program("curl", "/usr/bin/curl", &["-s", "http://localhost"], &[100]);
        let b = program("curl", "/usr/bin/curl", &["-s", "http://localhost"], &[200, 201]);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity(), 435_596_422);
    }

    #[test]
    fn test_identity_without_details() {
        let bare = Program {
            pid: 77,
            ..Default::default()
        };
        assert_eq!(bare.identity(), 1);
    }

    #[test]
    fn test_program_merge() {
        let mut out = Program::default();
        let mut stats = MergeStats::default();

        let mut first = program("java", "/usr/bin/java", &["-jar", "app.jar"], &[1, 2]);
        first.netrole = 0b01;
        first.uids = vec![1000];
        if let Some(info) = first.procinfo.as_mut() {
            info.resource_counters = Some(ResourceCategories {
                cpu_pct: Some(250),
                ..Default::default()
            });
            info.top_files = vec![FileStat {
                name: "/data/app.db".to_string(),
                bytes: Some(4096),
                ..Default::default()
            }];
        }

        let mut second = program("java", "/usr/bin/java", &["-jar", "app.jar"], &[2, 3]);
        second.netrole = 0b10;
        second.uids = vec![1000];
        second.program_reporting_group_ids = vec![7];

        out.aggregate(first, &mut stats);
        out.aggregate(second, &mut stats);

        assert_eq!(out.pids, vec![1, 2, 3]);
        assert_eq!(out.uids, vec![1000]);
        assert_eq!(out.netrole, 0b11);
        assert_eq!(out.program_reporting_group_ids, vec![7]);
        let cpu = out
            .resource_counters()
            .and_then(|r| r.aggr_cpu_pct)
            .expect("cpu aggregated");
        assert_eq!(cpu.sum, 250);
        assert_eq!(cpu.weight, 1);
        let info = out.procinfo.as_ref().expect("procinfo");
        assert_eq!(info.top_files.len(), 1);
        assert_eq!(
            info.details.as_ref().map(|d| d.args.len()),
            Some(2),
            "args carried from the input"
        );
    }

    #[test]
    fn test_command_keeps_login_shell_distance() {
        let mut out = CommandDetails::default();
        let mut stats = MergeStats::default();

        out.aggregate(
            CommandDetails {
                timestamp: 1_700_000_000,
                cmdline: "bash -l".to_string(),
                login_shell_distance: Some(0),
                count: Some(1),
                ..Default::default()
            },
            &mut stats,
        );
        out.aggregate(
            CommandDetails {
                count: Some(2),
                ..Default::default()
            },
            &mut stats,
        );

        assert_eq!(out.login_shell_distance, Some(0));
        assert_eq!(out.cmdline, "bash -l");
        assert_eq!(out.aggr_count.map(|a| a.sum), Some(3));
    }
}
