use std::collections::HashMap;

use rusqlite::{params, Row};

use crate::db::models::Part;
use crate::db::repos::json_column;
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_part(row: &Row) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get("id")?,
        part_number: row.get("part_number")?,
        name: row.get("name")?,
        description: row.get("description")?,
        category: row.get("category")?,
        quantity_in_stock: row.get("quantity_in_stock")?,
        reorder_level: row.get("reorder_level")?,
        unit_cost: row.get("unit_cost")?,
        location: row.get("location")?,
        compatible_machines: json_column(9, row.get("compatible_machines")?)?,
    })
}

/// Fetch parts by part number. Returns a map keyed by the lowercased part
/// number so callers can check requested numbers case-insensitively; values
/// keep the part's own casing. Empty input returns an empty map without
/// issuing a query.
pub fn get_by_part_numbers(
    pool: &DbPool,
    part_numbers: &[String],
) -> Result<HashMap<String, Part>, AppError> {
    let mut parts = HashMap::new();

    if part_numbers.is_empty() {
        tracing::debug!("No part numbers requested, returning empty map");
        return Ok(parts);
    }

    let conn = pool.get()?;

    let placeholders: Vec<String> = (1..=part_numbers.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT * FROM parts WHERE lower(part_number) IN ({})",
        placeholders.join(", ")
    );
    let lowered: Vec<String> = part_numbers.iter().map(|n| n.to_ascii_lowercase()).collect();

    tracing::debug!(part_numbers = %part_numbers.join(", "), "Querying parts");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(lowered.iter()), row_to_part)?;
    for row in rows {
        let part = row?;
        parts.insert(part.part_number.to_ascii_lowercase(), part);
    }

    tracing::info!(
        found = parts.len(),
        requested = part_numbers.len(),
        "Found parts in inventory"
    );
    Ok(parts)
}

/// Insert a part. Used by seeding and tests.
pub fn insert(pool: &DbPool, part: &Part) -> Result<(), AppError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO parts
         (id, part_number, name, description, category, quantity_in_stock,
          reorder_level, unit_cost, location, compatible_machines)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            part.id,
            part.part_number,
            part.name,
            part.description,
            part.category,
            part.quantity_in_stock,
            part.reorder_level,
            part.unit_cost,
            part.location,
            serde_json::to_string(&part.compatible_machines)?,
        ],
    )?;
    Ok(())
}
