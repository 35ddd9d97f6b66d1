//! Users taking part in a match, held in seats.

use arbiter_protocol::{SlotId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantState {
    Active,
    /// Left a started match. The user keeps their seat (and their score)
    /// but no longer receives messages or acts.
    Left,
}

#[derive(Debug, Clone)]
pub(crate) struct Participant {
    pub user: UserId,
    pub state: ParticipantState,
    /// Removed from the match when the host changes a setting.
    pub leave_on_config_change: bool,
    pub wants_interrupt: bool,
    /// Assigned when the match starts.
    pub slots: Vec<SlotId>,
}

impl Participant {
    pub fn new(user: UserId, leave_on_config_change: bool) -> Self {
        Self {
            user,
            state: ParticipantState::Active,
            leave_on_config_change,
            wants_interrupt: false,
            slots: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ParticipantState::Active
    }
}

/// Numbered seats. A joining user takes the lowest free seat, so seat
/// order (and with it slot order) is stable while users come and go.
#[derive(Debug, Default)]
pub(crate) struct Seats {
    seats: Vec<Option<Participant>>,
}

impl Seats {
    /// Seats `participant` and returns the seat number.
    pub fn take(&mut self, participant: Participant) -> usize {
        match self.seats.iter().position(Option::is_none) {
            Some(seat) => {
                self.seats[seat] = Some(participant);
                seat
            }
            None => {
                self.seats.push(Some(participant));
                self.seats.len() - 1
            }
        }
    }

    pub fn vacate(&mut self, user: UserId) -> Option<Participant> {
        let seat = self
            .seats
            .iter()
            .position(|s| s.as_ref().is_some_and(|p| p.user == user))?;
        let participant = self.seats[seat].take();
        while matches!(self.seats.last(), Some(None)) {
            self.seats.pop();
        }
        participant
    }

    pub fn get(&self, user: UserId) -> Option<&Participant> {
        self.iter().find(|p| p.user == user)
    }

    pub fn get_mut(&mut self, user: UserId) -> Option<&mut Participant> {
        self.iter_mut().find(|p| p.user == user)
    }

    /// Participants in seat order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.seats.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.seats.iter_mut().flatten()
    }

    pub fn active(&self) -> impl Iterator<Item = &Participant> {
        self.iter().filter(|p| p.is_active())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated(users: &[u64]) -> Seats {
        let mut seats = Seats::default();
        for &u in users {
            seats.take(Participant::new(UserId(u), true));
        }
        seats
    }

    fn order(seats: &Seats) -> Vec<u64> {
        seats.iter().map(|p| p.user.0).collect()
    }

    #[test]
    fn test_take_appends_in_join_order() {
        let seats = seated(&[5, 3, 9]);
        assert_eq!(order(&seats), vec![5, 3, 9]);
        assert_eq!(seats.len(), 3);
    }

    #[test]
    fn test_take_reuses_lowest_free_seat() {
        let mut seats = seated(&[1, 2, 3]);
        seats.vacate(UserId(1));
        seats.vacate(UserId(2));
        assert_eq!(seats.take(Participant::new(UserId(4), true)), 0);
        assert_eq!(order(&seats), vec![4, 3]);
    }

    #[test]
    fn test_vacate_unknown_user_returns_none() {
        let mut seats = seated(&[1]);
        assert!(seats.vacate(UserId(2)).is_none());
        assert_eq!(seats.len(), 1);
    }

    #[test]
    fn test_vacate_last_seat_trims() {
        let mut seats = seated(&[1, 2]);
        seats.vacate(UserId(2));
        assert_eq!(seats.take(Participant::new(UserId(3), true)), 1);
    }

    #[test]
    fn test_active_skips_left_participants() {
        let mut seats = seated(&[1, 2]);
        seats.get_mut(UserId(1)).unwrap().state = ParticipantState::Left;
        let active: Vec<_> = seats.active().map(|p| p.user).collect();
        assert_eq!(active, vec![UserId(2)]);
    }
}
