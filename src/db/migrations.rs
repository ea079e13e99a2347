use rusqlite::Connection;

use crate::error::AppError;

/// Run the consolidated schema migration. Idempotent.
pub fn run(conn: &Connection) -> Result<(), AppError> {
    tracing::debug!("Running database migrations");

    conn.execute_batch(SCHEMA)?;

    tracing::info!("Database migrations complete");
    Ok(())
}

const SCHEMA: &str = r#"

-- ============================================================================
-- Technicians (grouped by department)
-- ============================================================================

CREATE TABLE IF NOT EXISTS technicians (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    department          TEXT NOT NULL,
    skills              TEXT NOT NULL DEFAULT '[]',
    certifications      TEXT NOT NULL DEFAULT '[]',
    available           INTEGER NOT NULL DEFAULT 1,
    current_assignment  TEXT,
    shift_start         TEXT NOT NULL DEFAULT '08:00',
    shift_end           TEXT NOT NULL DEFAULT '16:00'
);
CREATE INDEX IF NOT EXISTS idx_technicians_department ON technicians(department);
CREATE INDEX IF NOT EXISTS idx_technicians_available  ON technicians(available);

-- ============================================================================
-- Parts inventory (part_number is the natural key, unique within a category)
-- ============================================================================

CREATE TABLE IF NOT EXISTS parts (
    id                  TEXT PRIMARY KEY,
    part_number         TEXT NOT NULL,
    name                TEXT NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    category            TEXT NOT NULL,
    quantity_in_stock   INTEGER NOT NULL DEFAULT 0,
    reorder_level       INTEGER NOT NULL DEFAULT 0,
    unit_cost           REAL NOT NULL DEFAULT 0,
    location            TEXT NOT NULL DEFAULT '',
    compatible_machines TEXT NOT NULL DEFAULT '[]',
    UNIQUE(category, part_number COLLATE NOCASE)
);
CREATE INDEX IF NOT EXISTS idx_parts_part_number ON parts(part_number COLLATE NOCASE);

-- ============================================================================
-- Work orders (status is the partition/grouping key)
-- ============================================================================

CREATE TABLE IF NOT EXISTS work_orders (
    id                  TEXT PRIMARY KEY,
    work_order_number   TEXT NOT NULL,
    machine_id          TEXT NOT NULL,
    title               TEXT NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    type                TEXT NOT NULL DEFAULT 'corrective',
    priority            TEXT NOT NULL DEFAULT 'medium',
    status              TEXT NOT NULL DEFAULT 'pending',
    assigned_to         TEXT,
    notes               TEXT NOT NULL DEFAULT '',
    estimated_duration  INTEGER NOT NULL DEFAULT 0,
    parts_used          TEXT NOT NULL DEFAULT '[]',
    tasks               TEXT NOT NULL DEFAULT '[]',
    fault_id            TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_work_orders_status   ON work_orders(status);
CREATE INDEX IF NOT EXISTS idx_work_orders_fault_id ON work_orders(fault_id);

"#;
