//! Deferred tick-scheduled actions
//!
//! Brick regeneration, the hazard flash sequence, and the activate-all
//! script all run through this queue instead of wall-clock timers, so the
//! simulation stays deterministic and testable. Every entry captures the
//! session epoch at schedule time; entries from an older epoch are dropped
//! unexecuted, which is what makes teardown and restart safe against
//! stale callbacks.

/// What a deferred action does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Return a regenerating brick to active
    RegenBrick { col: u32, row: u32 },
    /// One step of the hazard paddle-flash feedback; the final step
    /// applies the life cost
    FlashStep { remaining: u32 },
    /// Award the next skill in the activate-all script
    ActivateNext { skill: usize },
}

/// Deferred actions outlive a lost life: the grid persists across lives,
/// a struck hazard's cost is owed regardless, and the activate-all script
/// runs to completion. Only a full restart (epoch bump) clears the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredAction {
    /// Tick at which the action fires
    pub fire_at: u64,
    /// Session epoch captured when scheduled
    pub epoch: u32,
    pub kind: ActionKind,
}

/// Remove and return the actions due at `now` for the current epoch, in
/// scheduling order. Stale-epoch entries are discarded without firing.
pub fn drain_due(timers: &mut Vec<DeferredAction>, now: u64, epoch: u32) -> Vec<DeferredAction> {
    let mut due = Vec::new();
    timers.retain(|a| {
        if a.epoch != epoch {
            return false;
        }
        if a.fire_at <= now {
            due.push(*a);
            return false;
        }
        true
    });
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(fire_at: u64, epoch: u32) -> DeferredAction {
        DeferredAction {
            fire_at,
            epoch,
            kind: ActionKind::RegenBrick { col: 0, row: 0 },
        }
    }

    #[test]
    fn test_drain_returns_due_keeps_future() {
        let mut timers = vec![action(5, 0), action(10, 0), action(5, 0)];
        let due = drain_due(&mut timers, 5, 0);
        assert_eq!(due.len(), 2);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].fire_at, 10);
    }

    #[test]
    fn test_stale_epoch_dropped_without_firing() {
        let mut timers = vec![action(5, 0), action(5, 1)];
        let due = drain_due(&mut timers, 100, 1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].epoch, 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_drain_preserves_scheduling_order() {
        let mut timers = vec![
            DeferredAction {
                fire_at: 3,
                epoch: 0,
                kind: ActionKind::ActivateNext { skill: 0 },
            },
            DeferredAction {
                fire_at: 3,
                epoch: 0,
                kind: ActionKind::ActivateNext { skill: 1 },
            },
        ];
        let due = drain_due(&mut timers, 3, 0);
        assert_eq!(due[0].kind, ActionKind::ActivateNext { skill: 0 });
        assert_eq!(due[1].kind, ActionKind::ActivateNext { skill: 1 });
    }

}
