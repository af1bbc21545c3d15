use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{parse_optional_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Specialty;
use crate::models::Practitioner;

const PRACTITIONER_COLUMNS: &str = "id, name, specialty, clinic_id, phone, available";

pub fn insert_practitioner(conn: &Connection, p: &Practitioner) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO practitioners (id, name, specialty, clinic_id, phone, available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            p.id.to_string(),
            p.name,
            p.specialty.as_str(),
            p.clinic_id.map(|id| id.to_string()),
            p.phone,
            p.available as i32,
        ],
    )?;
    Ok(())
}

type PractitionerRow = (String, String, String, Option<String>, Option<String>, i32);

fn read_row(row: &Row<'_>) -> rusqlite::Result<PractitionerRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_practitioner(row: PractitionerRow) -> Result<Practitioner, DatabaseError> {
    let (id, name, specialty, clinic_id, phone, available) = row;
    Ok(Practitioner {
        id: parse_uuid(&id)?,
        name,
        specialty: Specialty::from_str(&specialty)?,
        clinic_id: parse_optional_uuid(clinic_id)?,
        phone,
        available: available != 0,
    })
}

/// All practitioners, optionally restricted to one specialty, in registration order.
pub fn list_practitioners(
    conn: &Connection,
    specialty: Option<Specialty>,
) -> Result<Vec<Practitioner>, DatabaseError> {
    let rows: Vec<PractitionerRow> = match specialty {
        Some(s) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRACTITIONER_COLUMNS} FROM practitioners WHERE specialty = ?1 ORDER BY rowid"
            ))?;
            let mapped = stmt.query_map(params![s.as_str()], read_row)?;
            mapped.collect::<Result<_, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRACTITIONER_COLUMNS} FROM practitioners ORDER BY rowid"
            ))?;
            let mapped = stmt.query_map([], read_row)?;
            mapped.collect::<Result<_, _>>()?
        }
    };

    rows.into_iter().map(into_practitioner).collect()
}

/// First available practitioner of `specialty`, else the first available
/// General Medicine practitioner.
pub fn find_practitioner_by_specialty(
    conn: &Connection,
    specialty: Specialty,
) -> Result<Option<Practitioner>, DatabaseError> {
    let mut candidates = vec![specialty];
    if specialty != Specialty::GeneralMedicine {
        candidates.push(Specialty::GeneralMedicine);
    }

    for candidate in candidates {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {PRACTITIONER_COLUMNS} FROM practitioners
                     WHERE specialty = ?1 AND available = 1 ORDER BY rowid LIMIT 1"
                ),
                params![candidate.as_str()],
                read_row,
            )
            .optional()?;
        if let Some(row) = row {
            return into_practitioner(row).map(Some);
        }
    }
    Ok(None)
}
