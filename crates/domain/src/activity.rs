//! Append-only activity events and the typed view of their payloads.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use staffline_core::{AppError, AppResult, NonEmptyString, UserId};
use uuid::Uuid;

use crate::{AccountStatus, Role};

/// Audience of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Visible inside the actor's created-by tree.
    Team,
    /// Super-admin activity, visible to super admins only.
    Global,
}

impl VisibilityScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Global => "global",
        }
    }
}

impl FromStr for VisibilityScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "team" => Ok(Self::Team),
            "global" => Ok(Self::Global),
            _ => Err(AppError::Validation(format!(
                "unknown visibility scope value '{value}'"
            ))),
        }
    }
}

/// Breadth of an activity-log read requested by a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityScope {
    /// Only the viewer's own events.
    #[serde(rename = "self")]
    Own,
    /// Events from the viewer's created-by subtree.
    Team,
    /// Every event.
    All,
}

impl ActivityScope {
    /// Scopes ordered from widest to narrowest.
    pub const WIDEST_FIRST: [ActivityScope; 3] =
        [ActivityScope::All, ActivityScope::Team, ActivityScope::Own];

    /// Returns a stable transport value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "self",
            Self::Team => "team",
            Self::All => "all",
        }
    }
}

impl FromStr for ActivityScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "self" => Ok(Self::Own),
            "team" => Ok(Self::Team),
            "all" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown activity scope value '{value}'"
            ))),
        }
    }
}

/// Actions emitted by the access-control services themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// Emitted when an account is provisioned.
    UserProvisioned,
    /// Emitted when an account's role assignment is replaced.
    RoleChanged,
    /// Emitted when an account's status is transitioned.
    StatusChanged,
    /// Emitted when the activity log is exported.
    DataExported,
}

impl ActivityAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserProvisioned => "user.provisioned",
            Self::RoleChanged => "user.role_changed",
            Self::StatusChanged => "user.status_changed",
            Self::DataExported => "activity.exported",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user.provisioned" => Ok(Self::UserProvisioned),
            "user.role_changed" => Ok(Self::RoleChanged),
            "user.status_changed" => Ok(Self::StatusChanged),
            "activity.exported" => Ok(Self::DataExported),
            _ => Err(AppError::Validation(format!(
                "unknown activity action value '{value}'"
            ))),
        }
    }
}

/// Payload of a `user.role_changed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChangedDetails {
    /// Role held before the change, if any.
    pub previous_role: Option<Role>,
    /// Role held after the change.
    pub new_role: Role,
    /// Fields this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `user.status_changed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedDetails {
    /// Status before the transition.
    pub previous_status: AccountStatus,
    /// Status after the transition.
    pub new_status: AccountStatus,
    /// Fields this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `user.provisioned` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProvisionedDetails {
    /// Email of the new account.
    pub email: String,
    /// Initial role of the new account.
    pub role: Role,
    /// Fields this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of an `activity.exported` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataExportedDetails {
    /// Number of events included in the export.
    pub row_count: u64,
    /// Fields this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event payload: a known kind with validated fields, or an opaque object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActivityDetails {
    /// Known `user.role_changed` payload.
    RoleChanged(RoleChangedDetails),
    /// Known `user.status_changed` payload.
    StatusChanged(StatusChangedDetails),
    /// Known `user.provisioned` payload.
    UserProvisioned(UserProvisionedDetails),
    /// Known `activity.exported` payload.
    DataExported(DataExportedDetails),
    /// Payload of an action this crate does not model.
    Other(Map<String, Value>),
}

impl ActivityDetails {
    /// Parses a stored payload for `action`. `null` means no payload.
    pub fn parse(action: &str, value: Value) -> AppResult<Option<Self>> {
        let map = match value {
            Value::Null => return Ok(None),
            Value::Object(map) => map,
            other => {
                return Err(AppError::Validation(format!(
                    "details for '{action}' must be a JSON object, got '{other}'"
                )));
            }
        };

        let Ok(known) = ActivityAction::from_str(action) else {
            return Ok(Some(Self::Other(map)));
        };

        let object = Value::Object(map);
        let details = match known {
            ActivityAction::RoleChanged => serde_json::from_value(object).map(Self::RoleChanged),
            ActivityAction::StatusChanged => {
                serde_json::from_value(object).map(Self::StatusChanged)
            }
            ActivityAction::UserProvisioned => {
                serde_json::from_value(object).map(Self::UserProvisioned)
            }
            ActivityAction::DataExported => serde_json::from_value(object).map(Self::DataExported),
        }
        .map_err(|error| {
            AppError::Validation(format!("invalid details for action '{action}': {error}"))
        })?;

        Ok(Some(details))
    }

    /// Returns the known action this payload belongs to, or `None` for opaque payloads.
    #[must_use]
    pub fn action(&self) -> Option<ActivityAction> {
        match self {
            Self::RoleChanged(_) => Some(ActivityAction::RoleChanged),
            Self::StatusChanged(_) => Some(ActivityAction::StatusChanged),
            Self::UserProvisioned(_) => Some(ActivityAction::UserProvisioned),
            Self::DataExported(_) => Some(ActivityAction::DataExported),
            Self::Other(_) => None,
        }
    }

    /// Returns the JSON object persisted for this payload.
    pub fn to_json(&self) -> AppResult<Value> {
        serde_json::to_value(self).map_err(|error| {
            AppError::Internal(format!("failed to serialize activity details: {error}"))
        })
    }
}

/// Input for stamping a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityEvent {
    /// Account that performed the action.
    pub actor: UserId,
    /// Action label.
    pub action: String,
    /// Optional entity type label.
    pub entity_type: Option<String>,
    /// Optional entity identifier.
    pub entity_id: Option<String>,
    /// Optional payload.
    pub details: Option<ActivityDetails>,
    /// Account the action was aimed at, if any.
    pub target_user: Option<UserId>,
    /// Actor role at write time.
    pub performer_role: Role,
    /// Actor ancestry at write time, nearest creator first.
    pub created_by_chain: Vec<UserId>,
}

/// Immutable audit event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEvent {
    id: Uuid,
    actor: UserId,
    action: NonEmptyString,
    entity_type: Option<String>,
    entity_id: Option<String>,
    details: Option<ActivityDetails>,
    created_at: DateTime<Utc>,
    target_user: Option<UserId>,
    performer_role: Role,
    created_by_chain: Vec<UserId>,
}

impl ActivityEvent {
    /// Stamps a new event. Visibility is derived from the performer role.
    ///
    /// Typed details must belong to the action; opaque details only go with unmodelled
    /// actions.
    pub fn new(input: NewActivityEvent, id: Uuid, created_at: DateTime<Utc>) -> AppResult<Self> {
        if !input.performer_role.is_assignable() {
            return Err(AppError::Validation(format!(
                "activity performer '{}' must hold an assignable role",
                input.actor
            )));
        }

        let action = NonEmptyString::new(input.action)?;
        if let Some(details) = &input.details {
            let expected = ActivityAction::from_str(action.as_str()).ok();
            if details.action() != expected {
                return Err(AppError::Validation(format!(
                    "details do not match activity action '{}'",
                    action.as_str()
                )));
            }
        }

        Ok(Self {
            id,
            actor: input.actor,
            action,
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            details: input.details,
            created_at,
            target_user: input.target_user,
            performer_role: input.performer_role,
            created_by_chain: input.created_by_chain,
        })
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the acting account.
    #[must_use]
    pub fn actor(&self) -> UserId {
        self.actor
    }

    /// Returns the action label.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the entity type label.
    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    /// Returns the entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Returns the payload.
    #[must_use]
    pub fn details(&self) -> Option<&ActivityDetails> {
        self.details.as_ref()
    }

    /// Returns the write timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the targeted account.
    #[must_use]
    pub fn target_user(&self) -> Option<UserId> {
        self.target_user
    }

    /// Returns the actor's role at write time.
    #[must_use]
    pub fn performer_role(&self) -> Role {
        self.performer_role
    }

    /// Returns the actor's ancestry captured at write time.
    #[must_use]
    pub fn created_by_chain(&self) -> &[UserId] {
        self.created_by_chain.as_slice()
    }

    /// Returns whether a super admin performed the action.
    #[must_use]
    pub fn is_super_admin_activity(&self) -> bool {
        self.performer_role == Role::SuperAdmin
    }

    /// Returns the audience of this event.
    #[must_use]
    pub fn visibility_scope(&self) -> VisibilityScope {
        if self.is_super_admin_activity() {
            VisibilityScope::Global
        } else {
            VisibilityScope::Team
        }
    }
}

/// Untyped activity row as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLogRecord {
    /// Event identifier.
    pub event_id: Uuid,
    /// Acting account.
    pub actor: Uuid,
    /// Action label.
    pub action: String,
    /// Entity type label.
    pub entity_type: Option<String>,
    /// Entity identifier.
    pub entity_id: Option<String>,
    /// Raw payload.
    pub details: Value,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
    /// Stored visibility label.
    pub visibility_scope: String,
    /// Stored super-admin flag.
    pub is_super_admin_activity: bool,
    /// Targeted account.
    pub target_user: Option<Uuid>,
    /// Stored performer role label.
    pub performer_role: String,
    /// Stored ancestry, nearest creator first.
    pub created_by_chain: Vec<Uuid>,
}

impl TryFrom<&ActivityEvent> for ActivityLogRecord {
    type Error = AppError;

    fn try_from(event: &ActivityEvent) -> Result<Self, Self::Error> {
        let details = match &event.details {
            Some(details) => details.to_json()?,
            None => Value::Null,
        };

        Ok(Self {
            event_id: event.id,
            actor: event.actor.as_uuid(),
            action: event.action.as_str().to_owned(),
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id.clone(),
            details,
            created_at: event.created_at,
            visibility_scope: event.visibility_scope().as_str().to_owned(),
            is_super_admin_activity: event.is_super_admin_activity(),
            target_user: event.target_user.map(|user| user.as_uuid()),
            performer_role: event.performer_role.as_str().to_owned(),
            created_by_chain: event
                .created_by_chain
                .iter()
                .map(UserId::as_uuid)
                .collect(),
        })
    }
}

impl TryFrom<ActivityLogRecord> for ActivityEvent {
    type Error = AppError;

    fn try_from(record: ActivityLogRecord) -> Result<Self, Self::Error> {
        let performer_role = Role::from_str(record.performer_role.as_str())?;
        let visibility_scope = VisibilityScope::from_str(record.visibility_scope.as_str())?;
        let is_super_admin = performer_role == Role::SuperAdmin;

        if record.is_super_admin_activity != is_super_admin
            || (visibility_scope == VisibilityScope::Global) != is_super_admin
        {
            return Err(AppError::Validation(format!(
                "activity '{}' has inconsistent visibility flags for role '{}'",
                record.event_id,
                performer_role.as_str()
            )));
        }

        let details = ActivityDetails::parse(record.action.as_str(), record.details)?;

        Self::new(
            NewActivityEvent {
                actor: UserId::from_uuid(record.actor),
                action: record.action,
                entity_type: record.entity_type,
                entity_id: record.entity_id,
                details,
                target_user: record.target_user.map(UserId::from_uuid),
                performer_role,
                created_by_chain: record
                    .created_by_chain
                    .into_iter()
                    .map(UserId::from_uuid)
                    .collect(),
            },
            record.event_id,
            record.created_at,
        )
    }
}
