use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::models::WorkOrder;
use crate::db::repos::{datetime_column, json_column};
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_work_order(row: &Row) -> rusqlite::Result<WorkOrder> {
    Ok(WorkOrder {
        id: row.get("id")?,
        work_order_number: row.get("work_order_number")?,
        machine_id: row.get("machine_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        order_type: row.get("type")?,
        priority: row.get("priority")?,
        status: row.get("status")?,
        assigned_to: row.get("assigned_to")?,
        notes: row.get("notes")?,
        estimated_duration: row.get("estimated_duration")?,
        parts_used: json_column(11, row.get("parts_used")?)?,
        tasks: json_column(12, row.get("tasks")?)?,
        fault_id: row.get("fault_id")?,
        created_at: datetime_column(14, row.get("created_at")?)?,
        updated_at: datetime_column(15, row.get("updated_at")?)?,
    })
}

/// Persist a finalized work order. Creation timestamps are stamped here —
/// the store is the last authority on them. Returns the stored row read
/// back, not the caller's value. Fails on duplicate id.
pub fn create(pool: &DbPool, work_order: &WorkOrder) -> Result<WorkOrder, AppError> {
    let mut order = work_order.clone();
    let now = Utc::now();
    order.created_at = now;
    order.updated_at = now;

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO work_orders
         (id, work_order_number, machine_id, title, description, type,
          priority, status, assigned_to, notes, estimated_duration,
          parts_used, tasks, fault_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
        params![
            order.id,
            order.work_order_number,
            order.machine_id,
            order.title,
            order.description,
            order.order_type,
            order.priority,
            order.status,
            order.assigned_to,
            order.notes,
            order.estimated_duration,
            serde_json::to_string(&order.parts_used)?,
            serde_json::to_string(&order.tasks)?,
            order.fault_id,
            now.to_rfc3339(),
        ],
    )?;

    tracing::info!(
        work_order_number = %order.work_order_number,
        id = %order.id,
        status = %order.status,
        "Created work order"
    );

    get_by_id(pool, &order.id)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<WorkOrder, AppError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT * FROM work_orders WHERE id = ?1",
        params![id],
        row_to_work_order,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Work order {id}")),
        other => AppError::Database(other),
    })
}

/// List work orders in one status partition, newest first.
pub fn list_by_status(pool: &DbPool, status: &str) -> Result<Vec<WorkOrder>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM work_orders WHERE status = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![status], row_to_work_order)?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(row?);
    }
    Ok(orders)
}
