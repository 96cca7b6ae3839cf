//! Request record queries.
//!
//! Request state changes (approve, deny, mark available) are owned by the
//! request workflow; this module only creates records and reads them back.

use chrono::{DateTime, Utc};
use overseer_common::{Error, MediaId, MediaKind, Result};
use rusqlite::{Connection, Row};

use crate::models::{NewRequest, RequestRecord};

const SELECT_COLUMNS: &str =
    "SELECT id, media_id, media_kind, title, imdb_id, approved, available, requested_at
     FROM requests";

fn media_id_to_sql(id: MediaId) -> Result<i64> {
    i64::try_from(id.get())
        .map_err(|_| Error::invalid_input(format!("media id out of range: {id}")))
}

fn row_to_request(row: &Row<'_>) -> rusqlite::Result<RequestRecord> {
    let media_id: i64 = row.get(1)?;
    let kind: String = row.get(2)?;
    let requested_at: String = row.get(7)?;

    let media_kind = kind.parse::<MediaKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let requested_at = DateTime::parse_from_rfc3339(&requested_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(RequestRecord {
        id: row.get(0)?,
        media_id: MediaId::new(media_id as u64),
        media_kind,
        title: row.get(3)?,
        imdb_id: row.get(4)?,
        approved: row.get(5)?,
        available: row.get(6)?,
        requested_at,
    })
}

/// Create a new request record.
///
/// # Returns
///
/// * `Ok(RequestRecord)` - The created record
/// * `Err(Error::InvalidInput)` - If a request already exists for this
///   `(media_kind, media_id)` pair
/// * `Err(Error::Database)` - If any other database error occurs
pub fn create_request(conn: &Connection, new: &NewRequest) -> Result<RequestRecord> {
    let requested_at = Utc::now();

    let result = conn.execute(
        "INSERT INTO requests (media_id, media_kind, title, imdb_id, approved, available, requested_at)
         VALUES (:media_id, :media_kind, :title, :imdb_id, :approved, :available, :requested_at)",
        rusqlite::named_params! {
            ":media_id": media_id_to_sql(new.media_id)?,
            ":media_kind": new.media_kind.to_string(),
            ":title": new.title,
            ":imdb_id": new.imdb_id,
            ":approved": new.approved,
            ":available": new.available,
            ":requested_at": requested_at.to_rfc3339(),
        },
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(Error::invalid_input(format!(
                "{} {} has already been requested",
                new.media_kind, new.media_id
            )));
        }
        Err(e) => return Err(Error::database(e.to_string())),
    }

    Ok(RequestRecord {
        id: conn.last_insert_rowid(),
        media_id: new.media_id,
        media_kind: new.media_kind,
        title: new.title.clone(),
        imdb_id: new.imdb_id.clone(),
        approved: new.approved,
        available: new.available,
        requested_at,
    })
}

/// List every request of the given kind, oldest first.
pub fn list_requests(conn: &Connection, media_kind: MediaKind) -> Result<Vec<RequestRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE media_kind = :media_kind ORDER BY id"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let records = stmt
        .query_map(
            rusqlite::named_params! { ":media_kind": media_kind.to_string() },
            row_to_request,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_create_request() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let new = NewRequest::new(MediaId::new(603), MediaKind::Movie, "The Matrix")
            .approved(true)
            .imdb_id("tt0133093");
        let record = create_request(&conn, &new).unwrap();

        assert_eq!(record.media_id, MediaId::new(603));
        assert_eq!(record.media_kind, MediaKind::Movie);
        assert!(record.approved);
        assert!(!record.available);
        assert_eq!(record.imdb_id.as_deref(), Some("tt0133093"));
    }

    #[test]
    fn test_listed_request_round_trip() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let created = create_request(
            &conn,
            &NewRequest::new(MediaId::new(1), MediaKind::Movie, "A").available(true),
        )
        .unwrap();

        let listed = list_requests(&conn, MediaKind::Movie).unwrap();
        assert_eq!(listed.len(), 1);
        let found = &listed[0];
        assert_eq!(found.id, created.id);
        assert_eq!(found.title, "A");
        assert!(found.available);
        assert_eq!(
            found.requested_at.timestamp(),
            created.requested_at.timestamp()
        );
    }

    #[test]
    fn test_list_requests_empty() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(list_requests(&conn, MediaKind::Tv).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_request_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let new = NewRequest::new(MediaId::new(5), MediaKind::Movie, "Five");
        create_request(&conn, &new).unwrap();

        let err = create_request(&conn, &new).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_same_id_different_kind_allowed() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        create_request(&conn, &NewRequest::new(MediaId::new(7), MediaKind::Movie, "M")).unwrap();
        create_request(&conn, &NewRequest::new(MediaId::new(7), MediaKind::Tv, "T")).unwrap();

        assert_eq!(list_requests(&conn, MediaKind::Movie).unwrap().len(), 1);
        assert_eq!(list_requests(&conn, MediaKind::Tv).unwrap().len(), 1);
    }

    #[test]
    fn test_list_requests_ordered_by_creation() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        for (id, title) in [(30, "C"), (10, "A"), (20, "B")] {
            create_request(
                &conn,
                &NewRequest::new(MediaId::new(id), MediaKind::Movie, title),
            )
            .unwrap();
        }

        let titles: Vec<String> = list_requests(&conn, MediaKind::Movie)
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }
}
