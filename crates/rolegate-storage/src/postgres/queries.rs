use rolegate_core::auth_config::JunctionDescriptor;

use crate::traits::StorageError;

fn to_storage_error(e: sqlx::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

// Table and column names are interpolated; callers validate them as plain
// identifiers first.

pub async fn global_roles<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    table: &str,
    subject_id: i64,
) -> Result<Vec<String>, StorageError> {
    let query = format!("SELECT role FROM {table} WHERE subject_id = $1 ORDER BY id");
    let rows: Vec<(String,)> = sqlx::query_as(&query)
        .bind(subject_id)
        .fetch_all(executor)
        .await
        .map_err(to_storage_error)?;
    Ok(rows.into_iter().map(|(role,)| role).collect())
}

pub async fn object_roles<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    table: &str,
    subject_id: i64,
    object_type: &str,
    object_id: i64,
) -> Result<Vec<String>, StorageError> {
    let query = format!(
        r#"
        SELECT role FROM {table}
        WHERE subject_id = $1 AND object_type = $2 AND object_id = $3
        ORDER BY id
        "#
    );
    let rows: Vec<(String,)> = sqlx::query_as(&query)
        .bind(subject_id)
        .bind(object_type)
        .bind(object_id)
        .fetch_all(executor)
        .await
        .map_err(to_storage_error)?;
    Ok(rows.into_iter().map(|(role,)| role).collect())
}

pub async fn junction_parent<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    junction: &JunctionDescriptor,
    child_id: i64,
) -> Result<Option<i64>, StorageError> {
    let JunctionDescriptor {
        table,
        child_column,
        parent_column,
    } = junction;
    let query = format!(
        r#"
        SELECT {parent_column}::int8 FROM {table}
        WHERE {child_column} = $1
        ORDER BY {parent_column}
        LIMIT 1
        "#
    );
    let row: Option<(i64,)> = sqlx::query_as(&query)
        .bind(child_id)
        .fetch_optional(executor)
        .await
        .map_err(to_storage_error)?;
    Ok(row.map(|(parent_id,)| parent_id))
}
