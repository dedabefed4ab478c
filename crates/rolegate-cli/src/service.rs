use std::sync::Arc;

use rolegate_core::engine::{
    AdminCheck, AuthorizationService, AuthorizeRequest, Decision, EngineConfig,
    PermissionRepository,
};
use rolegate_core::entity::{Entity, Operation, SubjectId};

use crate::audit;
use crate::error::ApiError;
use crate::registry::EntityTypeRegistry;

#[derive(Debug, Clone)]
pub struct CheckInput {
    pub entity_type: String,
    pub subject: SubjectId,
    pub operation: Operation,
    pub entity: Option<Entity>,
}

/// Looks up the entity type, runs the engine and audits the outcome.
pub struct DecisionService<R: PermissionRepository, A: AdminCheck> {
    engine: AuthorizationService<R, A>,
    registry: Arc<EntityTypeRegistry>,
}

impl<R: PermissionRepository, A: AdminCheck> DecisionService<R, A> {
    pub fn new(
        repository: Arc<R>,
        admin: Arc<A>,
        registry: Arc<EntityTypeRegistry>,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            engine: AuthorizationService::new(repository, admin, engine_config),
            registry,
        }
    }

    pub fn registry(&self) -> &EntityTypeRegistry {
        &self.registry
    }

    pub async fn check(&self, input: CheckInput) -> Result<Decision, ApiError> {
        let auth_config = self
            .registry
            .get(&input.entity_type)
            .ok_or_else(|| ApiError::UnknownEntityType(input.entity_type.clone()))?;

        let object_id = input.entity.as_ref().and_then(Entity::id);
        let request = AuthorizeRequest {
            subject: input.subject,
            operation: input.operation,
            entity: input.entity,
        };

        match self.engine.authorize(&auth_config, &request).await {
            Ok(decision) => {
                tracing::debug!(
                    entity_type = %input.entity_type,
                    operation = %input.operation,
                    granted = decision.is_granted(),
                    "authorization evaluated"
                );
                audit::audit_decision(
                    input.subject,
                    &input.entity_type,
                    object_id,
                    input.operation,
                    &decision,
                );
                Ok(decision)
            }
            Err(e) => {
                audit::audit_authorize_failure(
                    input.subject,
                    &input.entity_type,
                    input.operation,
                    &e.to_string(),
                );
                Err(e.into())
            }
        }
    }

    /// Authorizes a write of `update` onto `current` and returns the part of
    /// the update the subject may apply.
    pub async fn filter_update(
        &self,
        entity_type: &str,
        subject: SubjectId,
        current: Entity,
        update: &Entity,
    ) -> Result<Entity, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest(
                "update must change at least one field".to_string(),
            ));
        }

        let decision = self
            .check(CheckInput {
                entity_type: entity_type.to_string(),
                subject,
                operation: Operation::Write,
                entity: Some(current),
            })
            .await?;

        if !decision.is_granted() {
            return Err(ApiError::Forbidden {
                object_type: entity_type.to_string(),
                operation: Operation::Write,
            });
        }

        let all_fields = self
            .registry
            .get(entity_type)
            .map(|config| config.all_fields().to_vec())
            .unwrap_or_default();
        let filtered = decision.filter_update(update, &all_fields);

        let dropped = update.len() - filtered.len();
        if dropped > 0 {
            tracing::info!(
                entity_type = entity_type,
                subject = subject.value(),
                dropped,
                "update restricted to writable fields"
            );
        }

        Ok(filtered)
    }
}
