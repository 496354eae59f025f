//! Scope resolution and per-event visibility decisions for activity feeds.

use serde::Serialize;
use staffline_core::UserId;

use crate::{ActivityEvent, ActivityLogRecord, ActivityScope, Capability, PermissionMatrix, Role};

/// Event counts a viewer would get for each scope.
///
/// Scopes the viewer may not request are reported as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScopeCounts {
    /// Count for the `self` scope.
    #[serde(rename = "self")]
    pub own: usize,
    /// Count for the `team` scope.
    pub team: Option<usize>,
    /// Count for the `all` scope.
    pub all: Option<usize>,
}

/// Result of filtering one event stream for one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityVisibility {
    /// Scope actually applied after downgrading.
    pub effective_scope: ActivityScope,
    /// Events the viewer is entitled to see, in input order.
    pub visible: Vec<ActivityEvent>,
    /// Per-scope counts for scope selector badges.
    pub counts: ScopeCounts,
}

/// Returns whether `role` may request `scope` at all.
#[must_use]
pub fn scope_permitted(role: Role, scope: ActivityScope) -> bool {
    match scope {
        ActivityScope::Own => true,
        ActivityScope::Team => PermissionMatrix::has(role, Capability::ViewTeamUsers),
        ActivityScope::All => PermissionMatrix::has(role, Capability::ViewAllUsers),
    }
}

/// Narrows `requested` to the widest scope the role holds that is not wider than requested.
#[must_use]
pub fn effective_scope(role: Role, requested: ActivityScope) -> ActivityScope {
    ActivityScope::WIDEST_FIRST
        .into_iter()
        .filter(|scope| *scope <= requested)
        .find(|scope| scope_permitted(role, *scope))
        .unwrap_or(ActivityScope::Own)
}

/// Returns the widest scope the role may request.
#[must_use]
pub fn widest_scope(role: Role) -> ActivityScope {
    effective_scope(role, ActivityScope::All)
}

/// Row-level visibility predicate for one viewer under an already-permitted scope.
///
/// Storage backends apply the same rule before paging so a page only ever holds rows the
/// viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRule {
    /// Account reading the log.
    pub viewer_id: UserId,
    /// Role of the viewer.
    pub viewer_role: Role,
    /// Scope applied to other accounts' events.
    pub scope: ActivityScope,
}

impl VisibilityRule {
    /// Builds the rule for `viewer_id` after downgrading `requested` to what the role holds.
    #[must_use]
    pub fn for_viewer(viewer_role: Role, viewer_id: UserId, requested: ActivityScope) -> Self {
        Self {
            viewer_id,
            viewer_role,
            scope: effective_scope(viewer_role, requested),
        }
    }

    /// Returns whether super-admin events of other accounts are withheld.
    #[must_use]
    pub fn hides_super_admin_activity(&self) -> bool {
        self.viewer_role != Role::SuperAdmin
    }

    /// Decides visibility from an event's actor, super-admin flag and ancestry.
    #[must_use]
    pub fn admits(
        &self,
        actor: UserId,
        is_super_admin_activity: bool,
        created_by_chain: &[UserId],
    ) -> bool {
        self.decide(actor == self.viewer_id, is_super_admin_activity, || {
            created_by_chain.contains(&self.viewer_id)
        })
    }

    /// Applies the rule to a raw stored row.
    #[must_use]
    pub fn admits_record(&self, record: &ActivityLogRecord) -> bool {
        let viewer = self.viewer_id.as_uuid();
        self.decide(record.actor == viewer, record.is_super_admin_activity, || {
            record.created_by_chain.contains(&viewer)
        })
    }

    fn decide(
        &self,
        own_event: bool,
        is_super_admin_activity: bool,
        in_chain: impl FnOnce() -> bool,
    ) -> bool {
        if own_event {
            return true;
        }

        if is_super_admin_activity && self.hides_super_admin_activity() {
            return false;
        }

        match self.scope {
            ActivityScope::Own => false,
            ActivityScope::Team => in_chain(),
            ActivityScope::All => true,
        }
    }
}

/// Decides whether one event is visible under an already-permitted scope.
#[must_use]
pub fn is_visible(
    event: &ActivityEvent,
    viewer_role: Role,
    viewer_id: UserId,
    scope: ActivityScope,
) -> bool {
    VisibilityRule {
        viewer_id,
        viewer_role,
        scope,
    }
    .admits(
        event.actor(),
        event.is_super_admin_activity(),
        event.created_by_chain(),
    )
}

/// Filters `events` for a viewer and computes the per-scope counts.
///
/// Scope requests beyond the viewer's role are downgraded, never widened.
#[must_use]
pub fn filter_activity(
    events: &[ActivityEvent],
    viewer_role: Role,
    requested_scope: ActivityScope,
    viewer_id: UserId,
) -> ActivityVisibility {
    let effective = effective_scope(viewer_role, requested_scope);
    let visible = events
        .iter()
        .filter(|event| is_visible(event, viewer_role, viewer_id, effective))
        .cloned()
        .collect();

    ActivityVisibility {
        effective_scope: effective,
        visible,
        counts: scope_counts(events, viewer_role, viewer_id),
    }
}

/// Computes the count the viewer would see for each scope.
#[must_use]
pub fn scope_counts(events: &[ActivityEvent], viewer_role: Role, viewer_id: UserId) -> ScopeCounts {
    let count_for = |scope: ActivityScope| {
        scope_permitted(viewer_role, scope).then(|| {
            events
                .iter()
                .filter(|event| is_visible(event, viewer_role, viewer_id, scope))
                .count()
        })
    };

    ScopeCounts {
        own: count_for(ActivityScope::Own).unwrap_or_default(),
        team: count_for(ActivityScope::Team),
        all: count_for(ActivityScope::All),
    }
}
