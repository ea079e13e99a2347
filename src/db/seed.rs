//! Demo seed data: a small technician roster and the parts referenced by
//! the fault mapping tables. Insert-or-ignore, so re-seeding is harmless.

use crate::db::models::{Part, Technician};
use crate::db::repos::{parts, technicians};
use crate::db::DbPool;
use crate::error::AppError;

pub fn seed_demo_data(pool: &DbPool) -> Result<(), AppError> {
    seed_technicians(pool)?;
    seed_parts(pool)?;
    tracing::info!("Demo data seeded");
    Ok(())
}

fn seed_technicians(pool: &DbPool) -> Result<(), AppError> {
    let roster: [(&str, &str, &str, &[&str], &[&str]); 6] = [
        (
            "T-001",
            "Marco Reyes",
            "curing",
            &["tire_curing_press", "temperature_control", "instrumentation", "mold_maintenance"],
            &["electrical_safety_l2"],
        ),
        (
            "T-002",
            "Ingrid Holm",
            "curing",
            &["tire_curing_press", "plc_troubleshooting", "hydraulic_systems", "bladder_replacement"],
            &["hydraulics_l3"],
        ),
        (
            "T-003",
            "Dev Chauhan",
            "building",
            &["tire_building_machine", "vibration_analysis", "bearing_replacement", "precision_alignment"],
            &["vibration_analyst_cat2"],
        ),
        (
            "T-004",
            "Sofia Marino",
            "extrusion",
            &["tire_extruder", "rubber_processing", "screw_maintenance", "motor_drives", "temperature_control"],
            &[],
        ),
        (
            "T-005",
            "Liu Wen",
            "quality",
            &["tire_uniformity_machine", "load_cell_calibration", "measurement_systems", "data_analysis"],
            &["metrology_l2"],
        ),
        (
            "T-006",
            "Pavel Novak",
            "mixing",
            &["banbury_mixer", "mechanical_systems", "preventive_maintenance", "general_maintenance"],
            &[],
        ),
    ];

    for (id, name, department, skills, certifications) in roster {
        technicians::insert(
            pool,
            &Technician {
                id: id.into(),
                name: name.into(),
                department: department.into(),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                certifications: certifications.iter().map(|s| s.to_string()).collect(),
                available: true,
                current_assignment: None,
                shift_start: "08:00".into(),
                shift_end: "16:00".into(),
            },
        )?;
    }

    tracing::debug!("Demo technicians seeded");
    Ok(())
}

fn seed_parts(pool: &DbPool) -> Result<(), AppError> {
    let inventory: [(&str, &str, &str, &str, i64, i64, f64, &str); 15] = [
        ("P-1001", "TCP-HTR-4KW", "Heater element 4kW", "heating", 6, 2, 340.0, "A-03-2"),
        ("P-1002", "GEN-TS-K400", "Type-K thermocouple 400C", "sensors", 24, 8, 42.5, "B-01-4"),
        ("P-1003", "TCP-BLD-800", "Curing bladder 800mm", "curing", 4, 2, 1280.0, "A-05-1"),
        ("P-1004", "TCP-SEAL-200", "Press seal kit 200", "curing", 10, 4, 96.0, "A-05-3"),
        ("P-1005", "TBM-BRG-6220", "Drum bearing 6220", "bearings", 8, 3, 210.0, "C-02-1"),
        ("P-1006", "TBM-LS-500N", "Load sensor 500N", "sensors", 5, 2, 615.0, "B-02-2"),
        ("P-1007", "TBM-SRV-5KW", "Servo drive 5kW", "drives", 2, 1, 2890.0, "C-04-1"),
        ("P-1008", "EXT-HTR-BAND", "Barrel heater band", "heating", 12, 4, 185.0, "A-03-5"),
        ("P-1009", "EXT-SCR-250", "Extruder screw 250mm", "extrusion", 1, 1, 7400.0, "D-01-1"),
        ("P-1010", "EXT-DIE-TR", "Tread die insert", "extrusion", 3, 1, 960.0, "D-01-4"),
        ("P-1011", "TUM-LC-2KN", "Load cell 2kN", "sensors", 4, 2, 820.0, "B-02-5"),
        ("P-1012", "TUM-ENC-5000", "Encoder 5000ppr", "sensors", 6, 2, 330.0, "B-03-1"),
        ("P-1013", "BMX-TIP-500", "Rotor tip set 500", "mixing", 2, 1, 4100.0, "E-01-2"),
        ("P-1014", "BMX-BRG-22320", "Mixer bearing 22320", "bearings", 4, 2, 530.0, "C-02-4"),
        ("P-1015", "BMX-SEAL-DP", "Dust-stop seal pack", "mixing", 9, 3, 140.0, "E-02-1"),
    ];

    for (id, number, name, category, stock, reorder, cost, location) in inventory {
        parts::insert(
            pool,
            &Part {
                id: id.into(),
                part_number: number.into(),
                name: name.into(),
                description: String::new(),
                category: category.into(),
                quantity_in_stock: stock,
                reorder_level: reorder,
                unit_cost: cost,
                location: location.into(),
                compatible_machines: vec![],
            },
        )?;
    }

    tracing::debug!("Demo parts inventory seeded");
    Ok(())
}
