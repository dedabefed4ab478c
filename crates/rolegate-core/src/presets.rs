//! Authorization configs shipped for documents attached to buildings,
//! resources and organizations.

use crate::auth_config::{AuthConfigError, EntityAuthConfig, JunctionDescriptor, ParentChainNode};
use crate::entity::Operation;
use crate::matrix::{Grant, MatrixNode, OperationGrants, PermissionMatrix};

pub const DOCUMENT_BUILDING: &str = "document_building";
pub const DOCUMENT_RESOURCE: &str = "document_resource";
pub const DOCUMENT_ORGANIZATION: &str = "document_organization";

pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_CASE_OFFICER: &str = "case_officer";

pub const OWNER_KEY: &str = "owner";
pub const OWNER_FIELD: &str = "owner_id";

const DOCUMENT_FIELDS: [&str; 6] = [
    "name",
    "description",
    "category",
    "focal_point_x",
    "focal_point_y",
    "rotation",
];

const CASE_OFFICER_FIELDS: [&str; 2] = ["category", "description"];

pub fn building_resource_junction() -> JunctionDescriptor {
    JunctionDescriptor::new("bb_building_resource", "resource_id", "building_id")
}

/// Documents owned by a building. The owner may be reassigned, so
/// `owner_id` is writable.
pub fn document_building() -> Result<EntityAuthConfig, AuthConfigError> {
    let mut all_fields = document_fields();
    all_fields.insert(3, OWNER_FIELD.to_string());

    EntityAuthConfig::new(
        DOCUMENT_BUILDING,
        document_matrix(owner_grants()),
        vec![ParentChainNode::field(OWNER_KEY, "building", OWNER_FIELD)],
        all_fields,
    )
}

/// Documents owned by a resource. Building roles reach the document through
/// the resource's building.
pub fn document_resource() -> Result<EntityAuthConfig, AuthConfigError> {
    let owner = owner_grants().with_parent("building", owner_grants());
    let chain = ParentChainNode::field(OWNER_KEY, "resource", OWNER_FIELD).with_child(
        ParentChainNode::junction("building", "building", building_resource_junction()),
    );

    EntityAuthConfig::new(
        DOCUMENT_RESOURCE,
        document_matrix(owner),
        vec![chain],
        document_fields(),
    )
}

pub fn document_organization() -> Result<EntityAuthConfig, AuthConfigError> {
    EntityAuthConfig::new(
        DOCUMENT_ORGANIZATION,
        document_matrix(owner_grants()),
        vec![ParentChainNode::field(OWNER_KEY, "organization", OWNER_FIELD)],
        document_fields(),
    )
}

pub fn builtin() -> Result<Vec<EntityAuthConfig>, AuthConfigError> {
    Ok(vec![
        document_building()?,
        document_resource()?,
        document_organization()?,
    ])
}

fn document_fields() -> Vec<String> {
    DOCUMENT_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn document_matrix(owner: MatrixNode) -> PermissionMatrix {
    PermissionMatrix::new()
        .with_default(Operation::Read, true)
        .with_global_role(ROLE_MANAGER, OperationGrants::all())
        .with_parent(OWNER_KEY, owner)
}

fn owner_grants() -> MatrixNode {
    MatrixNode::new()
        .with_role(ROLE_MANAGER, OperationGrants::all())
        .with_role(
            ROLE_CASE_OFFICER,
            OperationGrants::new()
                .with(Operation::Read, true)
                .with(Operation::Write, Grant::fields(CASE_OFFICER_FIELDS)),
        )
}
