//! Picking state machine, movement direction, and the completion decision.
//!
//! A picking is a stock transfer document grouping one or more moves.
//! The reconciliation engine never sets a picking's state directly; it
//! only decides *whether* the store's validate operation should run
//! (see [`all_moves_satisfied`]).

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Picking state
// ---------------------------------------------------------------------------

/// Lifecycle state of a picking.
///
/// Transitions: `draft -> assigned / partially_available -> done`, plus
/// `cancelled`. Only the completion evaluator moves a picking to `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickingState {
    Draft,
    Assigned,
    PartiallyAvailable,
    Done,
    Cancelled,
}

impl PickingState {
    /// Stable string form as stored in the database and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PickingState::Draft => "draft",
            PickingState::Assigned => "assigned",
            PickingState::PartiallyAvailable => "partially_available",
            PickingState::Done => "done",
            PickingState::Cancelled => "cancelled",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(PickingState::Draft),
            "assigned" => Ok(PickingState::Assigned),
            "partially_available" => Ok(PickingState::PartiallyAvailable),
            "done" => Ok(PickingState::Done),
            "cancelled" => Ok(PickingState::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown picking state: '{other}'"
            ))),
        }
    }

    /// States in which scanning is still in progress and auto-completion
    /// may be attempted.
    pub fn is_open(&self) -> bool {
        matches!(self, PickingState::Assigned | PickingState::PartiallyAvailable)
    }
}

/// Mobile sync status recorded on a picking after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Operation kind / movement direction
// ---------------------------------------------------------------------------

/// The kind of operation a picking performs, as configured on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickingKind {
    Incoming,
    Outgoing,
    Internal,
}

impl PickingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickingKind::Incoming => "incoming",
            PickingKind::Outgoing => "outgoing",
            PickingKind::Internal => "internal",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "incoming" => Ok(PickingKind::Incoming),
            "outgoing" => Ok(PickingKind::Outgoing),
            "internal" => Ok(PickingKind::Internal),
            other => Err(CoreError::Validation(format!(
                "Unknown picking kind: '{other}'"
            ))),
        }
    }

    /// Movement direction relative to the warehouse boundary.
    pub fn direction(&self) -> MoveDirection {
        match self {
            PickingKind::Incoming => MoveDirection::Inbound,
            PickingKind::Outgoing => MoveDirection::Outbound,
            PickingKind::Internal => MoveDirection::Internal,
        }
    }

    /// Short wire form used by the mobile client (`in` / `out` / `internal`).
    pub fn wire_str(&self) -> &'static str {
        match self {
            PickingKind::Incoming => "in",
            PickingKind::Outgoing => "out",
            PickingKind::Internal => "internal",
        }
    }
}

/// Direction of a stock movement. Serial identities may only be created
/// for inbound movements; outbound and internal movements require the
/// identity to already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Inbound,
    Outbound,
    Internal,
}

// ---------------------------------------------------------------------------
// Completion decision
// ---------------------------------------------------------------------------

/// Per-move progress snapshot. `done_qty` is always recomputed from the
/// current movement-line sums, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveProgress {
    pub move_id: DbId,
    pub expected_qty: f64,
    pub done_qty: f64,
}

/// Returns `true` when every move of a picking has at least its expected
/// quantity done. A picking without moves is trivially satisfied.
pub fn all_moves_satisfied(progress: &[MoveProgress]) -> bool {
    progress.iter().all(|m| m.done_qty >= m.expected_qty)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- state parsing --------------------------------------------------------

    #[test]
    fn state_round_trips() {
        for s in ["draft", "assigned", "partially_available", "done", "cancelled"] {
            assert_eq!(PickingState::parse(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_state_rejected() {
        assert!(PickingState::parse("teleported").is_err());
    }

    #[test]
    fn open_states() {
        assert!(PickingState::Assigned.is_open());
        assert!(PickingState::PartiallyAvailable.is_open());
        assert!(!PickingState::Draft.is_open());
        assert!(!PickingState::Done.is_open());
        assert!(!PickingState::Cancelled.is_open());
    }

    // -- kind / direction -----------------------------------------------------

    #[test]
    fn kind_round_trips() {
        for k in ["incoming", "outgoing", "internal"] {
            assert_eq!(PickingKind::parse(k).unwrap().as_str(), k);
        }
        assert!(PickingKind::parse("sideways").is_err());
    }

    #[test]
    fn direction_from_kind() {
        assert_eq!(PickingKind::Incoming.direction(), MoveDirection::Inbound);
        assert_eq!(PickingKind::Outgoing.direction(), MoveDirection::Outbound);
        assert_eq!(PickingKind::Internal.direction(), MoveDirection::Internal);
    }

    // -- completion decision --------------------------------------------------

    fn progress(expected: f64, done: f64) -> MoveProgress {
        MoveProgress {
            move_id: 1,
            expected_qty: expected,
            done_qty: done,
        }
    }

    #[test]
    fn all_satisfied_when_done_meets_expected() {
        assert!(all_moves_satisfied(&[progress(2.0, 2.0), progress(1.0, 3.0)]));
    }

    #[test]
    fn not_satisfied_when_any_move_short() {
        assert!(!all_moves_satisfied(&[progress(2.0, 2.0), progress(2.0, 1.0)]));
    }

    #[test]
    fn empty_picking_is_satisfied() {
        assert!(all_moves_satisfied(&[]));
    }
}
