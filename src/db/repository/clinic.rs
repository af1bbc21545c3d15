use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::Clinic;

pub fn insert_clinic(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinics (id, name, address, avg_consult_minutes) VALUES (?1, ?2, ?3, ?4)",
        params![
            clinic.id.to_string(),
            clinic.name,
            clinic.address,
            clinic.avg_consult_minutes,
        ],
    )?;
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<(String, String, Option<String>, u32)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

pub fn get_clinic(conn: &Connection, id: &Uuid) -> Result<Option<Clinic>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, address, avg_consult_minutes FROM clinics WHERE id = ?1",
            params![id.to_string()],
            read_row,
        )
        .optional()?;

    row.map(|(id, name, address, avg_consult_minutes)| {
        Ok(Clinic {
            id: parse_uuid(&id)?,
            name,
            address,
            avg_consult_minutes,
        })
    })
    .transpose()
}

pub fn list_clinics(conn: &Connection) -> Result<Vec<Clinic>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, address, avg_consult_minutes FROM clinics ORDER BY name")?;
    let rows = stmt.query_map([], read_row)?;

    let mut clinics = Vec::new();
    for row in rows {
        let (id, name, address, avg_consult_minutes) = row?;
        clinics.push(Clinic {
            id: parse_uuid(&id)?,
            name,
            address,
            avg_consult_minutes,
        });
    }
    Ok(clinics)
}
