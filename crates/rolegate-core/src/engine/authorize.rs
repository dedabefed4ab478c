use std::pin::Pin;
use std::sync::Arc;

use crate::auth_config::{EntityAuthConfig, ParentChainNode, ResolveMode};
use crate::entity::{Entity, Operation, SubjectId};
use crate::matrix::{Grant, ParentRolePermissions, RoleGrants};

use super::{AdminCheck, AuthzError, Decision, EngineConfig, PermissionRepository};

#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub subject: SubjectId,
    pub operation: Operation,
    /// Absent or id-less for objects that don't exist yet.
    pub entity: Option<Entity>,
}

impl AuthorizeRequest {
    pub fn new(subject: SubjectId, operation: Operation) -> Self {
        Self {
            subject,
            operation,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }
}

struct WalkContext<'a> {
    subject: SubjectId,
    operation: Operation,
    auth_config: &'a EntityAuthConfig,
}

pub struct AuthorizationService<R: PermissionRepository, A: AdminCheck> {
    repository: Arc<R>,
    admin: Arc<A>,
    config: EngineConfig,
}

impl<R: PermissionRepository, A: AdminCheck> AuthorizationService<R, A> {
    pub fn new(repository: Arc<R>, admin: Arc<A>, config: EngineConfig) -> Self {
        Self {
            repository,
            admin,
            config,
        }
    }

    /// Levels are tried in order: administrator, global roles, default,
    /// roles on the object itself, then the parent chain. The first level
    /// that grants wins; an explicit `false` for one role never stops the
    /// next role or level from granting.
    pub async fn authorize(
        &self,
        auth_config: &EntityAuthConfig,
        request: &AuthorizeRequest,
    ) -> Result<Decision, AuthzError> {
        let operation = request.operation;

        if self
            .admin
            .is_administrator(request.subject, &self.config.admin_scope)
            .await?
        {
            return Ok(evaluate_grant(&Grant::Allowed, operation, auth_config));
        }

        let matrix = auth_config.matrix();

        let global_roles = self.repository.global_roles(request.subject).await?;
        let decision = evaluate_roles(&global_roles, &matrix.global, operation, auth_config);
        if decision.is_granted() {
            return Ok(decision);
        }

        if let Some(grant) = matrix.default.get(operation) {
            let decision = evaluate_grant(grant, operation, auth_config);
            if decision.is_granted() {
                return Ok(decision);
            }
        }

        let Some(entity) = &request.entity else {
            return Ok(Decision::Denied);
        };

        if let Some(id) = entity.id() {
            let roles = self
                .repository
                .object_roles(request.subject, id, auth_config.object_type())
                .await?;
            let decision = evaluate_roles(&roles, &matrix.direct_roles, operation, auth_config);
            if decision.is_granted() {
                return Ok(decision);
            }
        }

        if matrix.parent_role_permissions.is_empty() {
            return Ok(Decision::Denied);
        }

        let ctx = WalkContext {
            subject: request.subject,
            operation,
            auth_config,
        };
        self.walk_parent_chain(
            auth_config.parent_chain(),
            &matrix.parent_role_permissions,
            entity,
            &ctx,
        )
        .await
    }

    fn walk_parent_chain<'a>(
        &'a self,
        nodes: &'a [ParentChainNode],
        permissions: &'a ParentRolePermissions,
        entity: &'a Entity,
        ctx: &'a WalkContext<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Decision, AuthzError>> + Send + 'a>> {
        Box::pin(async move {
            for node in nodes {
                let Some(entry) = permissions.get(&node.key) else {
                    continue;
                };

                let Some(parent_id) = self.resolve_parent_id(node, entity).await? else {
                    continue;
                };

                let roles = self
                    .repository
                    .object_roles(ctx.subject, parent_id, &node.object_type)
                    .await?;
                let decision = evaluate_roles(&roles, &entry.roles, ctx.operation, ctx.auth_config);
                if decision.is_granted() {
                    return Ok(decision);
                }

                if !node.children.is_empty() && entry.has_nested_chain() {
                    let parent = Entity::new().with_id(parent_id);
                    let decision = self
                        .walk_parent_chain(
                            &node.children,
                            &entry.parent_role_permissions,
                            &parent,
                            ctx,
                        )
                        .await?;
                    if decision.is_granted() {
                        return Ok(decision);
                    }
                }
            }

            Ok(Decision::Denied)
        })
    }

    async fn resolve_parent_id(
        &self,
        node: &ParentChainNode,
        entity: &Entity,
    ) -> Result<Option<i64>, AuthzError> {
        match &node.resolve {
            ResolveMode::Field { field } => Ok(entity.object_id(field)),
            ResolveMode::Junction { junction } => match entity.id() {
                Some(child_id) => {
                    self.repository
                        .resolve_junction_parent_id(child_id, junction)
                        .await
                }
                None => Ok(None),
            },
        }
    }
}

fn evaluate_roles(
    roles: &[String],
    block: &RoleGrants,
    operation: Operation,
    auth_config: &EntityAuthConfig,
) -> Decision {
    for role in roles {
        if let Some(grant) = block.get(role).and_then(|grants| grants.get(operation)) {
            let decision = evaluate_grant(grant, operation, auth_config);
            if decision.is_granted() {
                return decision;
            }
        }
    }
    Decision::Denied
}

fn evaluate_grant(grant: &Grant, operation: Operation, auth_config: &EntityAuthConfig) -> Decision {
    match (grant, operation) {
        (Grant::Denied, _) => Decision::Denied,
        (Grant::Allowed, Operation::Write) => {
            Decision::GrantedFields(auth_config.all_fields().iter().cloned().collect())
        }
        (Grant::Fields(fields), Operation::Write) if !fields.is_empty() => {
            Decision::GrantedFields(fields.clone())
        }
        (Grant::Allowed, _) => Decision::GrantedFull,
        (Grant::Fields(_), _) => Decision::Denied,
    }
}
