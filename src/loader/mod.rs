//! Input loading.
//!
//! Reads a [`Workbook`] with three sheets (`services`, `babies`, `beds`),
//! checks its structure and builds a [`Dataset`].
//!
//! Structural problems (missing sheet or column) are collected, logged at
//! error level and raised together as [`AllocError::Schema`]; nothing is
//! parsed from a workbook that fails this check.

mod workbook;

pub use workbook::{cell_text, Sheet, Workbook};

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::AllocationConfig;
use crate::error::{AllocError, Result};
use crate::models::{split_list, Dataset, Patient, Relation, Resource, ServiceCatalog};

/// Required sheets and their required columns.
pub const REQUIRED_COLUMNS: [(&str, &[&str]); 3] = [
    ("services", &["services"]),
    (
        "babies",
        &["babies", "babies_service", "old_alloc_list", "treatment"],
    ),
    (
        "beds",
        &[
            "all_beds",
            "new_beds",
            "old_beds",
            "going_out",
            "new_beds_service",
            "old_beds_service",
            "beds_capacities",
            "priority",
            "treatment",
        ],
    ),
];

/// Checks that every required sheet and column exists.
pub fn check_schema(workbook: &Workbook) -> Result<()> {
    let mut problems = Vec::new();
    for (sheet_name, columns) in REQUIRED_COLUMNS {
        let Some(sheet) = workbook.sheet(sheet_name) else {
            problems.push(format!("missing sheet '{sheet_name}'"));
            continue;
        };
        for column in columns {
            if !sheet.has_column(column) {
                problems.push(format!("missing column '{column}' in sheet '{sheet_name}'"));
            }
        }
    }
    if problems.is_empty() {
        return Ok(());
    }
    for p in &problems {
        log::error!("Error in workbook structure: {p}");
    }
    Err(AllocError::Schema(problems))
}

/// Builds a dataset from a workbook.
pub fn load_workbook(workbook: &Workbook, config: &AllocationConfig) -> Result<Dataset> {
    check_schema(workbook)?;
    let (Some(services), Some(babies), Some(beds)) = (
        workbook.sheet("services"),
        workbook.sheet("babies"),
        workbook.sheet("beds"),
    ) else {
        return Err(AllocError::Schema(vec!["missing sheet".to_string()]));
    };

    let catalog = ServiceCatalog::new(services.column("services").into_iter().flatten());
    let patients = read_patients(babies, config);
    let resources = read_resources(beds, config);
    log::info!(
        "loaded {} services, {} babies, {} beds",
        catalog.len(),
        patients.len(),
        resources.len()
    );
    Ok(Dataset::new(catalog, patients, resources, config))
}

/// Reads a JSON workbook from disk and builds a dataset.
pub fn load_path(path: impl AsRef<Path>, config: &AllocationConfig) -> Result<Dataset> {
    let path = path.as_ref();
    log::info!("reading {}", path.display());
    let workbook = Workbook::read(path)?;
    load_workbook(&workbook, config)
}

/// Row ids of a sheet, with blank ids and duplicates dropped (first row wins).
fn unique_rows(sheet: &Sheet, sheet_name: &str, id_column: &str) -> Vec<(usize, String)> {
    let mut seen = BTreeSet::new();
    let mut rows = Vec::with_capacity(sheet.len());
    for (row, id) in sheet.column(id_column).into_iter().enumerate() {
        let Some(id) = id else {
            log::warn!("row {row} of sheet '{sheet_name}' has no '{id_column}', skipped");
            continue;
        };
        if !seen.insert(id.clone()) {
            log::warn!("duplicate id '{id}' in sheet '{sheet_name}', keeping the first row");
            continue;
        }
        rows.push((row, id));
    }
    rows
}

fn read_patients(sheet: &Sheet, config: &AllocationConfig) -> Vec<Patient> {
    let rows = unique_rows(sheet, "babies", "babies");

    rows.iter()
        .map(|(r, id)| {
            let mut patient = Patient::new(id.as_str());
            let listed = sheet.text(*r, "babies_service").unwrap_or_default();
            for s in split_list(&listed, config.delimiter) {
                patient = patient.with_service(s);
            }
            if let Some(t) = sheet.text(*r, "treatment") {
                patient = patient.with_treatment(t);
            }
            if let Some(o) = sheet.text(*r, "old_alloc_list") {
                patient = patient.with_old_place(o);
            }
            patient
        })
        .collect()
}

fn read_resources(sheet: &Sheet, config: &AllocationConfig) -> Vec<Resource> {
    let rows = unique_rows(sheet, "beds", "all_beds");
    let services = Relation::from_rows(
        rows.iter()
            .map(|(r, id)| (Some(id.as_str()), sheet.text(*r, "new_beds_service"))),
        config.delimiter,
    );
    let treatments = Relation::from_rows(
        rows.iter()
            .map(|(r, id)| (Some(id.as_str()), sheet.text(*r, "treatment"))),
        config.delimiter,
    );

    let mut resources = Vec::with_capacity(rows.len());
    for (r, id) in &rows {
        let mut bed = Resource::new(id.as_str());
        if flag(sheet.raw(*r, "new_beds"), config) {
            bed = bed.new_place();
        }
        if flag(sheet.raw(*r, "old_beds"), config) {
            bed = bed.old();
        }
        if flag(sheet.raw(*r, "going_out"), config) {
            bed = bed.leaving();
        }
        for s in services.values_of(id) {
            bed = bed.with_service(s);
        }
        for t in treatments.values_of(id) {
            if t != config.no_treatment {
                bed = bed.with_treatment(t);
            }
        }
        if let Some(raw) = sheet.raw(*r, "beds_capacities") {
            match capacity(raw) {
                Some(c) => bed = bed.with_capacity(c),
                None => log::warn!("bed '{id}': capacity {raw} is not a non-negative integer"),
            }
        }
        bed = bed.with_priority(priority(sheet.raw(*r, "priority"), config));

        if bed.is_new && bed.capacity.is_none() && bed.id != config.out_place {
            log::warn!("new bed '{id}' has no capacity, counted as 0");
        }
        resources.push(bed);
    }
    resources
}

fn flag(cell: Option<&Value>, config: &AllocationConfig) -> bool {
    match cell {
        Some(Value::Bool(b)) => *b,
        Some(v) => config.is_yes(cell_text(v).as_deref()),
        None => false,
    }
}

/// Capacity cell as a non-negative integer.
fn capacity(cell: &Value) -> Option<u32> {
    match cell {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return u32::try_from(u).ok();
            }
            let f = n.as_f64()?;
            (f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>().ok().or_else(|| {
                let f: f64 = s.parse().ok()?;
                (f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
            })
        }
        _ => None,
    }
}

/// Priority cell: a non-zero number, `true` or the yes flag.
fn priority(cell: Option<&Value>, config: &AllocationConfig) -> bool {
    match cell {
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Bool(b)) => *b,
        Some(v) => config.is_yes(cell_text(v).as_deref()),
        None => false,
    }
}
