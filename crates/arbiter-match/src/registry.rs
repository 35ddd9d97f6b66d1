//! Who is in which match, and which group hosts which match.
//!
//! Two rules hold across the whole engine: a user is bound to at most one
//! match, and a group to at most one match. Both indexes sit behind one
//! mutex. Matches take this lock while holding their own, never the other
//! way around.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbiter_protocol::{GroupId, MatchId, UserId};

use crate::{Match, MatchError};

#[derive(Default)]
struct Bindings {
    matches: HashMap<MatchId, Arc<Match>>,
    groups: HashMap<GroupId, MatchId>,
    users: HashMap<UserId, MatchId>,
}

#[derive(Default)]
pub(crate) struct Registry {
    bindings: Mutex<Bindings>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, Bindings> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new match with its host.
    pub fn insert(&self, m: &Arc<Match>, host: UserId) -> Result<(), MatchError> {
        let mut b = self.lock();
        if let Some(&other) = b.users.get(&host) {
            return Err(MatchError::InOtherMatch(host, other));
        }
        if let Some(group) = m.group() {
            if let Some(&other) = b.groups.get(&group) {
                return Err(MatchError::GroupOccupied(group, other));
            }
            b.groups.insert(group, m.id());
        }
        b.users.insert(host, m.id());
        b.matches.insert(m.id(), Arc::clone(m));
        Ok(())
    }

    pub fn bind_user(&self, user: UserId, id: MatchId) -> Result<(), MatchError> {
        let mut b = self.lock();
        match b.users.get(&user) {
            Some(&other) if other != id => Err(MatchError::InOtherMatch(user, other)),
            _ => {
                b.users.insert(user, id);
                Ok(())
            }
        }
    }

    pub fn unbind_user(&self, user: UserId, id: MatchId) {
        let mut b = self.lock();
        if b.users.get(&user) == Some(&id) {
            b.users.remove(&user);
        }
    }

    /// Forgets the match and every binding that points at it.
    pub fn release(&self, id: MatchId) {
        let mut b = self.lock();
        b.matches.remove(&id);
        b.groups.retain(|_, m| *m != id);
        b.users.retain(|_, m| *m != id);
    }

    pub fn get(&self, id: MatchId) -> Option<Arc<Match>> {
        self.lock().matches.get(&id).cloned()
    }

    pub fn user_match(&self, user: UserId) -> Option<MatchId> {
        self.lock().users.get(&user).copied()
    }

    pub fn by_user(&self, user: UserId) -> Option<Arc<Match>> {
        let b = self.lock();
        b.users.get(&user).and_then(|id| b.matches.get(id)).cloned()
    }

    pub fn by_group(&self, group: GroupId) -> Option<Arc<Match>> {
        let b = self.lock();
        b.groups.get(&group).and_then(|id| b.matches.get(id)).cloned()
    }

    pub fn all(&self) -> Vec<Arc<Match>> {
        let mut all: Vec<_> = self.lock().matches.values().cloned().collect();
        all.sort_by_key(|m| m.id());
        all
    }
}
