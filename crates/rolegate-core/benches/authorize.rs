use std::collections::HashMap;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use rolegate_core::auth_config::{EntityAuthConfig, JunctionDescriptor};
use rolegate_core::engine::{
    AuthorizationService, AuthorizeRequest, AuthzError, EngineConfig, NoAdministrators,
    PermissionRepository,
};
use rolegate_core::entity::{Entity, Operation, SubjectId};
use rolegate_core::matrix::{OperationGrants, PermissionMatrix};
use rolegate_core::presets;

#[derive(Default)]
struct BenchRepository {
    global: Vec<String>,
    object: HashMap<(String, i64), Vec<String>>,
    junctions: HashMap<i64, i64>,
}

impl PermissionRepository for BenchRepository {
    async fn global_roles(&self, _subject: SubjectId) -> Result<Vec<String>, AuthzError> {
        Ok(self.global.clone())
    }

    async fn object_roles(
        &self,
        _subject: SubjectId,
        object_id: i64,
        object_type: &str,
    ) -> Result<Vec<String>, AuthzError> {
        Ok(self
            .object
            .get(&(object_type.to_string(), object_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_junction_parent_id(
        &self,
        child_id: i64,
        _junction: &JunctionDescriptor,
    ) -> Result<Option<i64>, AuthzError> {
        Ok(self.junctions.get(&child_id).copied())
    }
}

fn make_service(
    repository: BenchRepository,
) -> AuthorizationService<BenchRepository, NoAdministrators> {
    AuthorizationService::new(
        Arc::new(repository),
        Arc::new(NoAdministrators),
        EngineConfig::default(),
    )
}

fn document(owner_id: i64) -> AuthorizeRequest {
    AuthorizeRequest::new(SubjectId::new(100), Operation::Write)
        .with_entity(Entity::new().with_id(10).with_field("owner_id", owner_id))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_default_read(c: &mut Criterion) {
    let rt = runtime();
    let config = presets::document_building().unwrap();
    let service = make_service(BenchRepository::default());
    let request = AuthorizeRequest::new(SubjectId::new(100), Operation::Read);

    c.bench_function("authorize_default_read", |b| {
        b.to_async(&rt)
            .iter(|| async { service.authorize(&config, &request).await.unwrap() });
    });
}

fn bench_global_write(c: &mut Criterion) {
    let rt = runtime();
    let config = presets::document_building().unwrap();
    let service = make_service(BenchRepository {
        global: vec!["manager".to_string()],
        ..Default::default()
    });
    let request = document(20);

    c.bench_function("authorize_global_write", |b| {
        b.to_async(&rt)
            .iter(|| async { service.authorize(&config, &request).await.unwrap() });
    });
}

fn bench_parent_write(c: &mut Criterion) {
    let rt = runtime();
    let config = presets::document_building().unwrap();
    let mut repository = BenchRepository::default();
    repository
        .object
        .insert(("building".to_string(), 20), vec!["case_officer".to_string()]);
    let service = make_service(repository);
    let request = document(20);

    c.bench_function("authorize_parent_write", |b| {
        b.to_async(&rt)
            .iter(|| async { service.authorize(&config, &request).await.unwrap() });
    });
}

fn bench_grandparent_write(c: &mut Criterion) {
    let rt = runtime();
    let config = presets::document_resource().unwrap();
    let mut repository = BenchRepository::default();
    repository.junctions.insert(30, 42);
    repository
        .object
        .insert(("building".to_string(), 42), vec!["manager".to_string()]);
    let service = make_service(repository);
    let request = document(30);

    c.bench_function("authorize_grandparent_write", |b| {
        b.to_async(&rt)
            .iter(|| async { service.authorize(&config, &request).await.unwrap() });
    });
}

fn bench_many_denied_roles(c: &mut Criterion) {
    let rt = runtime();
    let mut matrix = PermissionMatrix::new();
    let mut roles = Vec::new();
    for i in 0..50 {
        let role = format!("role{i}");
        matrix = matrix.with_global_role(
            role.clone(),
            OperationGrants::new().with(Operation::Delete, false),
        );
        roles.push(role);
    }
    let config = EntityAuthConfig::new("document", matrix, vec![], vec![]).unwrap();
    let service = make_service(BenchRepository {
        global: roles,
        ..Default::default()
    });
    let request = AuthorizeRequest::new(SubjectId::new(100), Operation::Delete)
        .with_entity(Entity::new().with_id(10));

    c.bench_function("authorize_50_denied_roles", |b| {
        b.to_async(&rt)
            .iter(|| async { service.authorize(&config, &request).await.unwrap() });
    });
}

criterion_group!(
    benches,
    bench_default_read,
    bench_global_write,
    bench_parent_write,
    bench_grandparent_write,
    bench_many_denied_roles,
);
criterion_main!(benches);
