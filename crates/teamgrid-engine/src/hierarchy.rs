//! Hierarchy resolver: pure traversals over a manager-graph snapshot
//!
//! Each action loads the `user_managers` table once (inside its
//! transaction) into a [`ManagerGraph`] and runs worklist traversals on
//! it. Keeping the traversals free of store access makes termination and
//! depth handling testable in isolation.

use std::collections::{HashMap, HashSet, VecDeque};

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder};
use uuid::Uuid;

use teamgrid_db::entities::user_manager;

/// One manager reached while walking upward from a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManagerLink {
    /// The manager gaining (or holding) derived access
    pub manager_id: Uuid,
    /// The immediate downstream link the manager was reached through
    pub via: Uuid,
    /// Hops above the starting user (1 = direct manager)
    pub depth: usize,
}

/// In-memory snapshot of the "manages" graph.
///
/// Upward adjacency only: `managers[user]` lists the users directly
/// managing `user`, in edge-creation order.
#[derive(Clone, Debug, Default)]
pub struct ManagerGraph {
    managers: HashMap<Uuid, Vec<Uuid>>,
}

impl ManagerGraph {
    /// Build a graph from (user, manager) edges.
    pub fn new<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Uuid)>,
    {
        let mut managers: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (user_id, manager_id) in edges {
            managers.entry(user_id).or_default().push(manager_id);
        }
        Self { managers }
    }

    /// Load the current edge set, ordered by creation time so traversal
    /// order (and therefore mutation-log order) is stable.
    pub async fn load<C: ConnectionTrait>(conn: &C) -> Result<Self, DbErr> {
        let edges = user_manager::Entity::find()
            .order_by_asc(user_manager::Column::CreatedAt)
            .order_by_asc(user_manager::Column::UserId)
            .all(conn)
            .await?;

        Ok(Self::new(
            edges.into_iter().map(|e| (e.user_id, e.manager_id)),
        ))
    }

    /// Direct managers of `user_id`, in edge order.
    pub fn direct_managers(&self, user_id: Uuid) -> &[Uuid] {
        self.managers
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every manager in `user_id`'s upward closure, breadth-first
    /// (nearest first), at most `max_depth` hops up. Multi-parent chains
    /// yield several managers per level; a manager reachable along more
    /// than one path is reported once, through the shortest path found.
    pub fn managers_of(&self, user_id: Uuid, max_depth: usize) -> Vec<ManagerLink> {
        let mut links = Vec::new();
        let mut seen: HashSet<Uuid> = HashSet::from([user_id]);
        let mut queue: VecDeque<(Uuid, usize)> = VecDeque::from([(user_id, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for &manager_id in self.direct_managers(current) {
                if seen.insert(manager_id) {
                    links.push(ManagerLink {
                        manager_id,
                        via: current,
                        depth: depth + 1,
                    });
                    queue.push_back((manager_id, depth + 1));
                }
            }
        }

        links
    }

    /// Would inserting the edge "manager_id manages user_id" close a
    /// cycle? True iff `user_id` already appears anywhere in
    /// `manager_id`'s upward closure, over all parallel paths.
    pub fn would_create_cycle(&self, user_id: Uuid, manager_id: Uuid) -> bool {
        if user_id == manager_id {
            return true;
        }

        let mut seen: HashSet<Uuid> = HashSet::from([manager_id]);
        let mut stack = vec![manager_id];

        while let Some(current) = stack.pop() {
            for &upper in self.direct_managers(current) {
                if upper == user_id {
                    return true;
                }
                if seen.insert(upper) {
                    stack.push(upper);
                }
            }
        }

        false
    }

    /// Length of the longest upward chain starting at `user_id`,
    /// considering every parent at every level. Guarded against cycles
    /// so it terminates even on a graph that slipped past validation.
    pub fn depth_of(&self, user_id: Uuid) -> usize {
        let mut memo: HashMap<Uuid, usize> = HashMap::new();
        let mut on_path: HashSet<Uuid> = HashSet::new();
        // (node, children_expanded) pairs; post-order over the DAG
        let mut stack = vec![(user_id, false)];

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                on_path.remove(&node);
                let depth = self
                    .direct_managers(node)
                    .iter()
                    .filter_map(|m| memo.get(m).map(|d| d + 1))
                    .max()
                    .unwrap_or(0);
                memo.insert(node, depth);
            } else {
                if memo.contains_key(&node) || !on_path.insert(node) {
                    continue;
                }
                stack.push((node, true));
                for &manager_id in self.direct_managers(node) {
                    if !memo.contains_key(&manager_id) && !on_path.contains(&manager_id) {
                        stack.push((manager_id, false));
                    }
                }
            }
        }

        memo.get(&user_id).copied().unwrap_or(0)
    }
}
