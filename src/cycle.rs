//! # Rotation detection over the wait queues.
//!
//! The wait queues double as a directed graph: devices are vertices and
//! every queued transfer is an edge from its destination device (the queue
//! it sits in) to its source device. A transfer that cannot get a slot
//! closes a rotation when some path of queued transfers leads back to its
//! own destination — that whole loop can swap slots and release together.
//!
//! The search is a plain DFS walking the queues directly; no separate
//! adjacency structure is kept. Queues are scanned in FIFO order and the
//! first closing path wins. Adds have no source and therefore no outgoing
//! edge: they can never sit inside a rotation.

use std::collections::{HashMap, HashSet};

use crate::ids::{ComponentId, DeviceId};
use crate::queue::WaitQueue;

/// Searches for a rotation closing back to `origin`, starting from the
/// queue of the requesting transfer's `source` device.
///
/// Returns the queued participants along the closing path, ordered from the
/// requester outward: the first entry waits on the requester's source
/// device, the last one's source is `origin` itself.
pub(crate) fn find_rotation(
    queues: &HashMap<DeviceId, WaitQueue>,
    origin: DeviceId,
    source: DeviceId,
) -> Option<Vec<ComponentId>> {
    let mut visited = HashSet::from([origin]);
    let mut path = Vec::new();
    walk(queues, source, origin, &mut visited, &mut path).then_some(path)
}

fn walk(
    queues: &HashMap<DeviceId, WaitQueue>,
    device: DeviceId,
    origin: DeviceId,
    visited: &mut HashSet<DeviceId>,
    path: &mut Vec<ComponentId>,
) -> bool {
    visited.insert(device);
    let Some(queue) = queues.get(&device) else {
        return false;
    };
    for waiter in queue.iter() {
        let Some(next) = waiter.source else {
            continue;
        };
        if next == origin {
            path.push(waiter.component);
            return true;
        }
        if !visited.contains(&next) {
            path.push(waiter.component);
            if walk(queues, next, origin, visited, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}
