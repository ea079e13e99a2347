use rusqlite::{params, Row};

use crate::db::models::Technician;
use crate::db::repos::json_column;
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_technician(row: &Row) -> rusqlite::Result<Technician> {
    Ok(Technician {
        id: row.get("id")?,
        name: row.get("name")?,
        department: row.get("department")?,
        skills: json_column(3, row.get("skills")?)?,
        certifications: json_column(4, row.get("certifications")?)?,
        available: row.get::<_, i64>("available")? != 0,
        current_assignment: row.get("current_assignment")?,
        shift_start: row.get("shift_start")?,
        shift_end: row.get("shift_end")?,
    })
}

/// Find technicians who are currently available AND have at least one of
/// the required skills. The skill match is case-insensitive and done in
/// memory (skills live in a JSON column, so SQL can't intersect them).
pub fn get_available_by_skills(
    pool: &DbPool,
    required_skills: &[String],
) -> Result<Vec<Technician>, AppError> {
    let conn = pool.get()?;

    tracing::debug!("Querying available technicians");

    let mut stmt = conn.prepare("SELECT * FROM technicians WHERE available = 1 ORDER BY id")?;
    let rows = stmt.query_map([], row_to_technician)?;

    let mut technicians = Vec::new();
    for row in rows {
        let tech = row?;
        if tech.has_any_skill(required_skills) {
            technicians.push(tech);
        }
    }

    tracing::info!(
        count = technicians.len(),
        "Found available technicians with required skills"
    );
    Ok(technicians)
}

/// Look up a single technician by ID within a department (the group key).
/// Returns `Ok(None)` when no such technician exists.
pub fn get_by_id(
    pool: &DbPool,
    id: &str,
    department: &str,
) -> Result<Option<Technician>, AppError> {
    let conn = pool.get()?;
    match conn.query_row(
        "SELECT * FROM technicians WHERE id = ?1 AND department = ?2",
        params![id, department],
        row_to_technician,
    ) {
        Ok(tech) => Ok(Some(tech)),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            tracing::warn!(id = id, "Technician not found");
            Ok(None)
        }
        Err(other) => Err(AppError::Database(other)),
    }
}

/// Insert a technician. Used by seeding and tests.
pub fn insert(pool: &DbPool, tech: &Technician) -> Result<(), AppError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO technicians
         (id, name, department, skills, certifications, available,
          current_assignment, shift_start, shift_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            tech.id,
            tech.name,
            tech.department,
            serde_json::to_string(&tech.skills)?,
            serde_json::to_string(&tech.certifications)?,
            tech.available as i64,
            tech.current_assignment,
            tech.shift_start,
            tech.shift_end,
        ],
    )?;
    Ok(())
}
