//! Static fault-type → required skills / required parts tables.
//!
//! All entries are known at build time; lookups are case-insensitive and
//! total. An unknown fault type is not an error — it maps to the
//! general-maintenance defaults.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Skills assumed when the fault type is unknown.
const DEFAULT_SKILLS: &[&str] = &["general_maintenance"];

/// Parts assumed when the fault type is unknown (none).
const DEFAULT_PARTS: &[&str] = &[];

/// Fault types → skills required to diagnose and repair them.
/// Specific to tire manufacturing equipment.
const FAULT_TO_SKILLS: &[(&str, &[&str])] = &[
    (
        "curing_temperature_excessive",
        &[
            "tire_curing_press", "temperature_control", "instrumentation",
            "electrical_systems", "plc_troubleshooting", "mold_maintenance",
        ],
    ),
    (
        "curing_cycle_time_deviation",
        &[
            "tire_curing_press", "plc_troubleshooting", "mold_maintenance",
            "bladder_replacement", "hydraulic_systems", "instrumentation",
        ],
    ),
    (
        "building_drum_vibration",
        &[
            "tire_building_machine", "vibration_analysis", "bearing_replacement",
            "alignment", "precision_alignment", "drum_balancing", "mechanical_systems",
        ],
    ),
    (
        "ply_tension_excessive",
        &[
            "tire_building_machine", "tension_control", "servo_systems",
            "precision_alignment", "sensor_alignment", "plc_programming",
        ],
    ),
    (
        "extruder_barrel_overheating",
        &[
            "tire_extruder", "temperature_control", "rubber_processing",
            "screw_maintenance", "instrumentation", "electrical_systems", "motor_drives",
        ],
    ),
    (
        "low_material_throughput",
        &[
            "tire_extruder", "rubber_processing", "screw_maintenance",
            "motor_drives", "temperature_control",
        ],
    ),
    (
        "high_radial_force_variation",
        &[
            "tire_uniformity_machine", "data_analysis", "measurement_systems",
            "tire_building_machine", "tire_curing_press",
        ],
    ),
    (
        "load_cell_drift",
        &[
            "tire_uniformity_machine", "load_cell_calibration", "measurement_systems",
            "sensor_alignment", "instrumentation",
        ],
    ),
    (
        "mixing_temperature_excessive",
        &[
            "banbury_mixer", "temperature_control", "rubber_processing",
            "instrumentation", "electrical_systems", "mechanical_systems",
        ],
    ),
    (
        "excessive_mixer_vibration",
        &[
            "banbury_mixer", "vibration_analysis", "bearing_replacement",
            "alignment", "mechanical_systems", "preventive_maintenance",
        ],
    ),
];

/// Fault types → part numbers typically needed for the repair.
/// Part numbers reference the parts inventory store.
const FAULT_TO_PARTS: &[(&str, &[&str])] = &[
    ("curing_temperature_excessive", &["TCP-HTR-4KW", "GEN-TS-K400"]),
    ("curing_cycle_time_deviation", &["TCP-BLD-800", "TCP-SEAL-200"]),
    ("building_drum_vibration", &["TBM-BRG-6220"]),
    ("ply_tension_excessive", &["TBM-LS-500N", "TBM-SRV-5KW"]),
    ("extruder_barrel_overheating", &["EXT-HTR-BAND", "GEN-TS-K400"]),
    ("low_material_throughput", &["EXT-SCR-250", "EXT-DIE-TR"]),
    // No specific parts needed for uniformity deviations
    ("high_radial_force_variation", &[]),
    ("load_cell_drift", &["TUM-LC-2KN", "TUM-ENC-5000"]),
    ("mixing_temperature_excessive", &["BMX-TIP-500", "GEN-TS-K400"]),
    ("excessive_mixer_vibration", &["BMX-BRG-22320", "BMX-SEAL-DP"]),
];

type FaultTable = HashMap<&'static str, &'static [&'static str]>;

fn skills_table() -> &'static FaultTable {
    static TABLE: OnceLock<FaultTable> = OnceLock::new();
    TABLE.get_or_init(|| FAULT_TO_SKILLS.iter().copied().collect())
}

fn parts_table() -> &'static FaultTable {
    static TABLE: OnceLock<FaultTable> = OnceLock::new();
    TABLE.get_or_init(|| FAULT_TO_PARTS.iter().copied().collect())
}

fn lookup(table: &'static FaultTable, fault_type: &str, default: &'static [&'static str]) -> &'static [&'static str] {
    let key = fault_type.trim().to_ascii_lowercase();
    if key.is_empty() {
        return default;
    }
    table.get(key.as_str()).copied().unwrap_or(default)
}

/// Skills required to repair the given fault type.
pub fn required_skills(fault_type: &str) -> &'static [&'static str] {
    lookup(skills_table(), fault_type, DEFAULT_SKILLS)
}

/// Part numbers required to repair the given fault type.
pub fn required_parts(fault_type: &str) -> &'static [&'static str] {
    lookup(parts_table(), fault_type, DEFAULT_PARTS)
}
