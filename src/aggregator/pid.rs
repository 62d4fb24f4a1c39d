use std::collections::HashMap;

use crate::schema::Metrics;

/// Maps raw process ids to program identities for one snapshot.
///
/// Raw pids are recycled by the kernel and differ between snapshots, so
/// records that reference a process are rewritten to the owning program's
/// identity before merging. Identities are assumed never to collide with a
/// live pid; nothing checks this.
#[derive(Debug, Default, Clone)]
pub struct PidMap {
    map: HashMap<u64, u64>,
}

impl PidMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the map from the snapshot's programs and rewrites every
    /// pid-reference field of the snapshot.
    ///
    /// Programs get their `pid` replaced by their identity. Connection
    /// endpoints and command pids are rewritten through the map; pids no
    /// program in this snapshot claims are left as they are.
    pub fn substitute(&mut self, input: &mut Metrics) {
        self.map.clear();

        for program in &mut input.programs {
            let identity = program.identity();
            // pid 0 means unset.
            if program.pid != 0 {
                self.map.insert(program.pid, identity);
            }
            for &pid in program.pids.iter().filter(|&&pid| pid != 0) {
                self.map.insert(pid, identity);
            }
            program.pid = identity;
        }

        if self.map.is_empty() {
            return;
        }

        for conn in input
            .ipv4_connections
            .iter_mut()
            .chain(input.ipv4_incomplete_connections.iter_mut())
        {
            conn.spid = self.resolve(conn.spid);
            conn.dpid = self.resolve(conn.dpid);
        }

        for command in &mut input.commands {
            command.pid = self.resolve(command.pid);
            command.ppid = self.resolve(command.ppid);
        }
    }

    /// Identity for `pid`, or `pid` itself when no program claims it.
    pub fn resolve(&self, pid: u64) -> u64 {
        self.map.get(&pid).copied().unwrap_or(pid)
    }

    pub fn get(&self, pid: u64) -> Option<u64> {
        self.map.get(&pid).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.map.iter().map(|(&pid, &identity)| (pid, identity))
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
