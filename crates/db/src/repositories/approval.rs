//! Approval repository: workflow configuration and request lifecycle.
//!
//! Every request mutation locks the request row first, rebuilds the state
//! machine from the stored actions, applies one transition and writes the
//! result back with a history row. Final approval posts the document inside
//! the same transaction, so a request is never APPROVED without its entry.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use tally_core::approval::{
    ApprovalError, ApprovalMachine, ApprovalModule, ApproverRole, ChainAction, Decision,
    HistoryAction, Priority, RequestState, StepDefinition, Transition, WorkflowDefinition,
    WorkflowSelector, request_code,
};
use tally_core::ledger::{LedgerError, PostingRequest};

use super::ledger::LedgerRepository;
use crate::entities::{
    approval_actions, approval_history, approval_requests, approval_steps, approval_workflows,
    sea_orm_active_enums as db,
};

/// Produces the journal posting for a fully approved request.
///
/// Implemented by the document service that owns the request's entity.
#[async_trait::async_trait]
pub trait JournalSource: Send + Sync {
    /// Builds the balanced posting for `request`.
    async fn posting_for(
        &self,
        request: &approval_requests::Model,
    ) -> Result<PostingRequest, LedgerError>;
}

/// One step of a workflow being configured.
#[derive(Debug, Clone)]
pub struct StepInput {
    /// Position in the chain.
    pub step_order: i32,
    /// Display name.
    pub name: String,
    /// Role that approves this step.
    pub approver_role: ApproverRole,
    /// Only instantiated when escalated to.
    pub is_optional: bool,
    /// Time limit in hours, informational.
    pub time_limit_hours: i32,
}

/// Input for configuring a workflow tier.
#[derive(Debug, Clone)]
pub struct CreateWorkflowInput {
    /// Workflow name.
    pub name: String,
    /// Gated module.
    pub module: ApprovalModule,
    /// Inclusive lower bound.
    pub min_amount: Decimal,
    /// Inclusive upper bound, 0 = unbounded.
    pub max_amount: Decimal,
    /// Whether the tier is selectable.
    pub is_active: bool,
    /// Steps.
    pub steps: Vec<StepInput>,
}

/// Input for submitting a document for approval.
#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    /// Gated module.
    pub module: ApprovalModule,
    /// Document type, e.g. `purchase_invoice`.
    pub entity_type: String,
    /// Document id.
    pub entity_id: Uuid,
    /// Document amount used for tier selection.
    pub amount: Decimal,
    /// Title shown to approvers.
    pub title: String,
    /// Submitting user.
    pub requested_by: Uuid,
    /// Initial priority.
    pub priority: Priority,
}

/// An approve or reject decision on the current step.
#[derive(Debug, Clone)]
pub struct ActionInput {
    /// Request.
    pub request_id: Uuid,
    /// Step the actor believes is current.
    pub step_order: i32,
    /// Acting user.
    pub actor_id: Uuid,
    /// Role of the acting user.
    pub actor_role: ApproverRole,
    /// Decision.
    pub decision: Decision,
    /// Free-text comments.
    pub comments: Option<String>,
}

/// A request with its actions in step order.
#[derive(Debug, Clone)]
pub struct RequestWithActions {
    /// The request.
    pub request: approval_requests::Model,
    /// Instantiated actions.
    pub actions: Vec<approval_actions::Model>,
}

impl RequestWithActions {
    /// Action the current step pointer designates.
    #[must_use]
    pub fn current_action(&self) -> Option<&approval_actions::Model> {
        let current = self.request.current_step_order?;
        self.actions.iter().find(|a| a.step_order == current)
    }
}

struct Acted<'a> {
    step_order: i32,
    actor_id: Uuid,
    comments: Option<&'a str>,
}

/// Approval repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a validated workflow tier with its steps.
    ///
    /// # Errors
    ///
    /// Returns a configuration error (bad bounds, duplicate step order, no
    /// required step, overlap with an active tier) or a database error.
    pub async fn create_workflow(
        &self,
        input: CreateWorkflowInput,
    ) -> Result<WorkflowDefinition, ApprovalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = load_workflows(&txn, Some(input.module)).await?;
        let candidate = WorkflowDefinition {
            id: Uuid::now_v7(),
            name: input.name,
            module: input.module,
            min_amount: input.min_amount,
            max_amount: input.max_amount,
            is_active: input.is_active,
            created_at: Utc::now(),
            steps: input
                .steps
                .into_iter()
                .map(|s| StepDefinition {
                    id: Uuid::now_v7(),
                    step_order: s.step_order,
                    name: s.name,
                    approver_role: s.approver_role,
                    is_optional: s.is_optional,
                    time_limit_hours: s.time_limit_hours,
                })
                .collect(),
        };
        WorkflowSelector::validate_definition(&candidate, &existing)?;

        let created_at: DateTimeWithTimeZone = candidate.created_at.into();
        approval_workflows::ActiveModel {
            id: Set(candidate.id),
            name: Set(candidate.name.clone()),
            module: Set(candidate.module.into()),
            min_amount: Set(candidate.min_amount),
            max_amount: Set(candidate.max_amount),
            is_active: Set(candidate.is_active),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        for step in &candidate.steps {
            approval_steps::ActiveModel {
                id: Set(step.id),
                workflow_id: Set(candidate.id),
                step_order: Set(step.step_order),
                step_name: Set(step.name.clone()),
                approver_role: Set(step.approver_role.into()),
                is_optional: Set(step.is_optional),
                time_limit_hours: Set(step.time_limit_hours),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        info!(
            workflow_id = %candidate.id,
            module = %candidate.module,
            min_amount = %candidate.min_amount,
            max_amount = %candidate.max_amount,
            steps = candidate.steps.len(),
            "Configured approval workflow"
        );
        Ok(candidate)
    }

    /// Activates or deactivates a workflow tier.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowNotFound`, or `OverlappingTier` when activation would
    /// overlap another active tier of the same module.
    pub async fn set_workflow_active(
        &self,
        workflow_id: Uuid,
        is_active: bool,
    ) -> Result<WorkflowDefinition, ApprovalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let row = approval_workflows::Entity::find_by_id(workflow_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(ApprovalError::WorkflowNotFound(workflow_id))?;
        let module = ApprovalModule::from(row.module);
        let existing = load_workflows(&txn, Some(module)).await?;
        let mut workflow = existing
            .iter()
            .find(|w| w.id == workflow_id)
            .cloned()
            .ok_or(ApprovalError::WorkflowNotFound(workflow_id))?;
        workflow.is_active = is_active;
        WorkflowSelector::validate_definition(&workflow, &existing)?;

        let mut active: approval_workflows::ActiveModel = row.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(workflow_id = %workflow_id, is_active, "Changed approval workflow state");
        Ok(workflow)
    }

    /// Lists workflows of a module, or of every module.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_workflows(
        &self,
        module: Option<ApprovalModule>,
    ) -> Result<Vec<WorkflowDefinition>, ApprovalError> {
        load_workflows(&self.db, module).await
    }

    /// Selects the workflow gating a document of `module` and `amount`.
    ///
    /// # Errors
    ///
    /// Returns `NoWorkflowConfigured` if no active tier covers the amount.
    pub async fn select_workflow(
        &self,
        module: ApprovalModule,
        amount: Decimal,
    ) -> Result<WorkflowDefinition, ApprovalError> {
        let workflows = load_workflows(&self.db, Some(module)).await?;
        WorkflowSelector::select(&workflows, module, amount).cloned()
    }

    /// Submits a document: selects its tier and instantiates the chain.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRequest` if the document already has a pending
    /// request, `NoWorkflowConfigured` if no tier covers it.
    pub async fn create_request(
        &self,
        input: CreateRequestInput,
    ) -> Result<RequestWithActions, ApprovalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let pending = approval_requests::Entity::find()
            .filter(approval_requests::Column::EntityType.eq(input.entity_type.as_str()))
            .filter(approval_requests::Column::EntityId.eq(input.entity_id))
            .filter(approval_requests::Column::Status.eq(db::RequestStatus::Pending))
            .count(&txn)
            .await
            .map_err(db_err)?;
        if pending > 0 {
            return Err(duplicate_request(&input));
        }

        let workflows = load_workflows(&txn, Some(input.module)).await?;
        let workflow = WorkflowSelector::select(&workflows, input.module, input.amount)?;
        let state = ApprovalMachine::start(workflow)?;

        let created_at = Utc::now();
        let now: DateTimeWithTimeZone = created_at.into();
        let request_id = Uuid::now_v7();
        let request = approval_requests::ActiveModel {
            id: Set(request_id),
            request_code: Set(request_code(input.module, created_at, request_id)),
            workflow_id: Set(workflow.id),
            module: Set(input.module.into()),
            entity_type: Set(input.entity_type.clone()),
            entity_id: Set(input.entity_id),
            amount: Set(input.amount),
            title: Set(input.title.clone()),
            status: Set(db::RequestStatus::Pending),
            priority: Set(input.priority.into()),
            current_step_order: Set(state.current_step),
            requested_by: Set(input.requested_by),
            reject_reason: Set(None),
            journal_entry_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                duplicate_request(&input)
            } else {
                db_err(e)
            }
        })?;

        sync_actions(&txn, request_id, &[], &state, None, now).await?;

        record_history(
            &txn,
            request_id,
            HistoryAction::Created,
            Some(input.requested_by),
            None,
            None,
            None,
            Some(json!({
                "workflow_id": workflow.id,
                "workflow_name": workflow.name,
                "amount": input.amount.to_string(),
                "approvals_required": state.approvals_required(),
            })),
            now,
        )
        .await?;

        let actions = load_actions(&txn, request_id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            request_id = %request.id,
            request_code = %request.request_code,
            workflow_id = %workflow.id,
            amount = %input.amount,
            "Created approval request"
        );
        Ok(RequestWithActions { request, actions })
    }

    /// Approves or rejects the current step.
    ///
    /// On the last approval the document is posted through `source` in the
    /// same transaction; if posting fails nothing is written and the request
    /// stays pending at its last step.
    ///
    /// # Errors
    ///
    /// Returns `RoleMismatch`, `RequestAlreadyTerminal`, `StepNotActive`,
    /// `RejectionReasonRequired`, or `Posting` for a failed final posting.
    pub async fn record_action<S>(
        &self,
        input: ActionInput,
        source: &S,
    ) -> Result<RequestWithActions, ApprovalError>
    where
        S: JournalSource + ?Sized,
    {
        let txn = self.db.begin().await.map_err(db_err)?;

        let request = lock_request(&txn, input.request_id).await?;
        let rows = load_actions(&txn, request.id).await?;
        let mut state = request_state(&request, &rows);

        let transition =
            ApprovalMachine::record(&mut state, input.step_order, input.actor_role, &input.decision)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let reason = match &input.decision {
            Decision::Reject { reason } => Some(reason.trim().to_string()),
            Decision::Approve => None,
        };
        let comments = input.comments.as_deref().or(reason.as_deref());
        let acted = Acted {
            step_order: input.step_order,
            actor_id: input.actor_id,
            comments,
        };
        sync_actions(&txn, request.id, &rows, &state, Some(&acted), now).await?;

        let journal_entry_id = if transition.is_final_approval() {
            let posting = source.posting_for(&request).await?;
            let outcome = LedgerRepository::post_within(&txn, &posting).await?;
            Some(outcome.entry().entry.id)
        } else {
            None
        };

        let mut updated: approval_requests::ActiveModel = request.into();
        updated.status = Set(state.status.into());
        updated.current_step_order = Set(state.current_step);
        updated.updated_at = Set(now);
        if reason.is_some() {
            updated.reject_reason = Set(reason.clone());
        }
        if journal_entry_id.is_some() {
            updated.journal_entry_id = Set(journal_entry_id);
        }
        if state.status.is_terminal() {
            updated.completed_at = Set(Some(now));
        }
        let request = updated.update(&txn).await.map_err(db_err)?;

        let metadata = match transition {
            Transition::Advanced { to, .. } => Some(json!({ "next_step": to })),
            Transition::Completed { .. } => Some(json!({ "journal_entry_id": journal_entry_id })),
            _ => None,
        };
        record_history(
            &txn,
            request.id,
            transition.history_action(),
            Some(input.actor_id),
            Some(input.actor_role),
            Some(input.step_order),
            comments.map(str::to_string),
            metadata,
            now,
        )
        .await?;

        let actions = load_actions(&txn, request.id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            request_id = %request.id,
            step_order = input.step_order,
            actor_role = %input.actor_role,
            transition = ?transition,
            "Recorded approval action"
        );
        Ok(RequestWithActions { request, actions })
    }

    /// Adds an optional step ahead of the current one and raises priority.
    ///
    /// # Errors
    ///
    /// Returns `NotOptional`, `AlreadyEscalated`, `EscalationWouldRewind`,
    /// `RoleMismatch` or `RequestAlreadyTerminal`.
    pub async fn escalate(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        actor_role: ApproverRole,
        target_step_order: i32,
        comments: Option<String>,
    ) -> Result<RequestWithActions, ApprovalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let request = lock_request(&txn, request_id).await?;
        let workflow = load_workflow(&txn, request.workflow_id).await?;
        let rows = load_actions(&txn, request.id).await?;
        let mut state = request_state(&request, &rows);
        let from_step = state.current_step;

        let transition =
            ApprovalMachine::escalate(&mut state, &workflow, actor_role, target_step_order)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        sync_actions(&txn, request.id, &rows, &state, None, now).await?;

        let priority = Priority::from(request.priority).max(Priority::High);
        let mut updated: approval_requests::ActiveModel = request.into();
        updated.priority = Set(priority.into());
        updated.updated_at = Set(now);
        let request = updated.update(&txn).await.map_err(db_err)?;

        record_history(
            &txn,
            request.id,
            transition.history_action(),
            Some(actor_id),
            Some(actor_role),
            Some(target_step_order),
            comments,
            Some(json!({ "from_step": from_step })),
            now,
        )
        .await?;

        let actions = load_actions(&txn, request.id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            request_id = %request.id,
            target_step = target_step_order,
            actor_role = %actor_role,
            "Escalated approval request"
        );
        Ok(RequestWithActions { request, actions })
    }

    /// Withdraws a pending request. Only the requester may cancel.
    ///
    /// # Errors
    ///
    /// Returns `NotRequester` or `RequestAlreadyTerminal`.
    pub async fn cancel(
        &self,
        request_id: Uuid,
        requester_id: Uuid,
        reason: Option<String>,
    ) -> Result<RequestWithActions, ApprovalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let request = lock_request(&txn, request_id).await?;
        if request.requested_by != requester_id {
            return Err(ApprovalError::NotRequester(request_id));
        }
        let rows = load_actions(&txn, request.id).await?;
        let mut state = request_state(&request, &rows);
        let transition = ApprovalMachine::cancel(&mut state)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        sync_actions(&txn, request.id, &rows, &state, None, now).await?;

        let mut updated: approval_requests::ActiveModel = request.into();
        updated.status = Set(state.status.into());
        updated.current_step_order = Set(None);
        updated.updated_at = Set(now);
        updated.completed_at = Set(Some(now));
        let request = updated.update(&txn).await.map_err(db_err)?;

        record_history(
            &txn,
            request.id,
            transition.history_action(),
            Some(requester_id),
            None,
            None,
            reason,
            None,
            now,
        )
        .await?;

        let actions = load_actions(&txn, request.id).await?;
        txn.commit().await.map_err(db_err)?;

        info!(request_id = %request.id, "Cancelled approval request");
        Ok(RequestWithActions { request, actions })
    }

    /// Loads a request with its actions.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` or a database error.
    pub async fn find_request(&self, request_id: Uuid) -> Result<RequestWithActions, ApprovalError> {
        let request = approval_requests::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ApprovalError::RequestNotFound(request_id))?;
        let actions = load_actions(&self.db, request_id).await?;
        Ok(RequestWithActions { request, actions })
    }

    /// Pending requests whose current step `role` may act on, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn pending_for_role(
        &self,
        role: ApproverRole,
    ) -> Result<Vec<RequestWithActions>, ApprovalError> {
        let pending = approval_requests::Entity::find()
            .filter(approval_requests::Column::Status.eq(db::RequestStatus::Pending))
            .order_by_asc(approval_requests::Column::CreatedAt)
            .order_by_asc(approval_requests::Column::Id)
            .find_with_related(approval_actions::Entity)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(pending
            .into_iter()
            .map(|(request, mut actions)| {
                actions.sort_by_key(|a| a.step_order);
                RequestWithActions { request, actions }
            })
            .filter(|r| {
                r.current_action()
                    .is_some_and(|a| role.can_act_for(a.approver_role.into()))
            })
            .collect())
    }

    /// Audit trail of a request, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn history(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<approval_history::Model>, ApprovalError> {
        approval_history::Entity::find()
            .filter(approval_history::Column::RequestId.eq(request_id))
            .order_by_asc(approval_history::Column::CreatedAt)
            .order_by_asc(approval_history::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}

fn db_err(e: DbErr) -> ApprovalError {
    ApprovalError::Database(e.to_string())
}

fn duplicate_request(input: &CreateRequestInput) -> ApprovalError {
    ApprovalError::DuplicateRequest {
        entity_type: input.entity_type.clone(),
        entity_id: input.entity_id,
    }
}

async fn lock_request<C>(conn: &C, request_id: Uuid) -> Result<approval_requests::Model, ApprovalError>
where
    C: ConnectionTrait,
{
    approval_requests::Entity::find_by_id(request_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(ApprovalError::RequestNotFound(request_id))
}

async fn load_actions<C>(
    conn: &C,
    request_id: Uuid,
) -> Result<Vec<approval_actions::Model>, ApprovalError>
where
    C: ConnectionTrait,
{
    approval_actions::Entity::find()
        .filter(approval_actions::Column::RequestId.eq(request_id))
        .order_by_asc(approval_actions::Column::StepOrder)
        .all(conn)
        .await
        .map_err(db_err)
}

async fn load_workflows<C>(
    conn: &C,
    module: Option<ApprovalModule>,
) -> Result<Vec<WorkflowDefinition>, ApprovalError>
where
    C: ConnectionTrait,
{
    let mut query = approval_workflows::Entity::find().order_by_asc(approval_workflows::Column::CreatedAt);
    if let Some(module) = module {
        query = query.filter(approval_workflows::Column::Module.eq(db::ApprovalModule::from(module)));
    }

    let rows = query
        .find_with_related(approval_steps::Entity)
        .all(conn)
        .await
        .map_err(db_err)?;
    Ok(rows
        .into_iter()
        .map(|(workflow, steps)| to_definition(workflow, steps))
        .collect())
}

async fn load_workflow<C>(conn: &C, workflow_id: Uuid) -> Result<WorkflowDefinition, ApprovalError>
where
    C: ConnectionTrait,
{
    let workflow = approval_workflows::Entity::find_by_id(workflow_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(ApprovalError::WorkflowNotFound(workflow_id))?;
    let steps = workflow
        .find_related(approval_steps::Entity)
        .all(conn)
        .await
        .map_err(db_err)?;
    Ok(to_definition(workflow, steps))
}

fn to_definition(
    workflow: approval_workflows::Model,
    steps: Vec<approval_steps::Model>,
) -> WorkflowDefinition {
    WorkflowDefinition {
        id: workflow.id,
        name: workflow.name,
        module: workflow.module.into(),
        min_amount: workflow.min_amount,
        max_amount: workflow.max_amount,
        is_active: workflow.is_active,
        created_at: workflow.created_at.with_timezone(&Utc),
        steps: steps
            .into_iter()
            .map(|s| StepDefinition {
                id: s.id,
                step_order: s.step_order,
                name: s.step_name,
                approver_role: s.approver_role.into(),
                is_optional: s.is_optional,
                time_limit_hours: s.time_limit_hours,
            })
            .collect(),
    }
}

fn request_state(request: &approval_requests::Model, rows: &[approval_actions::Model]) -> RequestState {
    let mut actions: Vec<ChainAction> = rows
        .iter()
        .map(|a| ChainAction {
            step_id: a.step_id,
            step_order: a.step_order,
            approver_role: a.approver_role.into(),
            status: a.status.into(),
            escalated: a.escalated,
        })
        .collect();
    actions.sort_by_key(|a| a.step_order);

    RequestState {
        status: request.status.into(),
        current_step: request.current_step_order,
        actions,
    }
}

/// Writes the machine's action list back: status changes, the acting
/// approver's stamp, and rows for newly escalated steps.
async fn sync_actions<C>(
    conn: &C,
    request_id: Uuid,
    rows: &[approval_actions::Model],
    state: &RequestState,
    acted: Option<&Acted<'_>>,
    now: DateTimeWithTimeZone,
) -> Result<(), ApprovalError>
where
    C: ConnectionTrait,
{
    for action in &state.actions {
        let status = db::ActionStatus::from(action.status);
        let stamp = acted.filter(|a| a.step_order == action.step_order);

        match rows.iter().find(|r| r.step_order == action.step_order) {
            Some(row) if row.status == status && stamp.is_none() => {}
            Some(row) => {
                let mut updated: approval_actions::ActiveModel = row.clone().into();
                updated.status = Set(status);
                if let Some(stamp) = stamp {
                    updated.approver_id = Set(Some(stamp.actor_id));
                    updated.comments = Set(stamp.comments.map(str::to_string));
                    updated.action_date = Set(Some(now));
                }
                updated.update(conn).await.map_err(db_err)?;
            }
            None => {
                approval_actions::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    request_id: Set(request_id),
                    step_id: Set(action.step_id),
                    step_order: Set(action.step_order),
                    approver_role: Set(action.approver_role.into()),
                    status: Set(status),
                    escalated: Set(action.escalated),
                    approver_id: Set(None),
                    comments: Set(None),
                    action_date: Set(None),
                    created_at: Set(now),
                }
                .insert(conn)
                .await
                .map_err(db_err)?;
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn record_history<C>(
    conn: &C,
    request_id: Uuid,
    action: HistoryAction,
    actor_id: Option<Uuid>,
    actor_role: Option<ApproverRole>,
    step_order: Option<i32>,
    comments: Option<String>,
    metadata: Option<serde_json::Value>,
    now: DateTimeWithTimeZone,
) -> Result<(), ApprovalError>
where
    C: ConnectionTrait,
{
    approval_history::ActiveModel {
        id: Set(Uuid::now_v7()),
        request_id: Set(request_id),
        action: Set(action.into()),
        actor_id: Set(actor_id),
        actor_role: Set(actor_role.map(Into::into)),
        step_order: Set(step_order),
        comments: Set(comments),
        metadata: Set(metadata),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

