use crate::types::{User, UserId};

/// The set of users known to a session and their presence flags.
///
/// Membership is seeded once at session start and presence is fixed from
/// then on; no join/leave events exist in the current scope. Iteration
/// order is seed order.
#[derive(Debug, Default)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize membership. Duplicate ids are dropped, first occurrence
    /// wins. Seeding an already-seeded roster is ignored.
    pub fn seed(&mut self, users: Vec<User>) {
        if !self.users.is_empty() {
            tracing::warn!("roster already seeded, ignoring new membership");
            return;
        }
        for user in users {
            if self.users.iter().any(|u| u.id == user.id) {
                tracing::warn!(user_id = %user.id, "duplicate user id in seed, skipping");
                continue;
            }
            self.users.push(user);
        }
    }

    /// Full membership in seed order.
    pub fn all(&self) -> &[User] {
        &self.users
    }

    /// Online users except the given id, in roster order.
    pub fn online_excluding(&self, excluded: &UserId) -> Vec<User> {
        self.users
            .iter()
            .filter(|u| u.is_online && u.id != *excluded)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.users.iter().any(|u| u.id == *id)
    }

    pub fn online_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_online).count()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.users.clear();
    }

    /// The stock peers every fresh room is populated with.
    pub fn default_peers() -> Vec<User> {
        vec![
            User::new("1", "Alice", true),
            User::new("2", "Bob", true),
            User::new("3", "Charlie", false),
            User::new("4", "Diana", true),
        ]
    }
}
