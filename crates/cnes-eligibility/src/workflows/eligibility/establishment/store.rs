use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OpenFlags};
use tracing::error;

use super::lookup::{EstablishmentLookup, EstablishmentStatus, StoreError};

/// Service classification codes that make a facility count toward eligibility.
pub const QUALIFYING_SERVICE_CODES: [i64; 2] = [159, 152];

const COUNT_LISTED: &str = r#"SELECT COUNT(*) FROM all_estab_serv_class WHERE "CO_UNIDADE" = ?1"#;
const COUNT_QUALIFYING: &str = r#"SELECT COUNT(*) FROM all_estab_serv_class
    WHERE "CO_UNIDADE" = ?1 AND "CO_SERVICO" IN (?2, ?3)"#;

/// SQLite snapshot of facility service classifications.
pub struct SqliteEstablishmentStore {
    connection: Mutex<Connection>,
}

impl SqliteEstablishmentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| StoreError::Unavailable(format!("{}: {err}", path.display())))?;

        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    fn count(
        connection: &Connection,
        sql: &str,
        composite_id: &str,
        with_codes: bool,
    ) -> Result<i64, StoreError> {
        let result = if with_codes {
            connection.query_row(
                sql,
                params![
                    composite_id,
                    QUALIFYING_SERVICE_CODES[0],
                    QUALIFYING_SERVICE_CODES[1]
                ],
                |row| row.get(0),
            )
        } else {
            connection.query_row(sql, params![composite_id], |row| row.get(0))
        };

        result.map_err(|err| {
            error!(composite_id, %err, "establishment store query failed");
            StoreError::Query {
                composite_id: composite_id.to_string(),
                reason: err.to_string(),
            }
        })
    }
}

impl EstablishmentLookup for SqliteEstablishmentStore {
    fn lookup(&self, composite_id: &str) -> Result<EstablishmentStatus, StoreError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;

        if Self::count(&connection, COUNT_LISTED, composite_id, false)? == 0 {
            return Ok(EstablishmentStatus::Unknown);
        }

        let qualifying = Self::count(&connection, COUNT_QUALIFYING, composite_id, true)?;
        Ok(if qualifying > 0 {
            EstablishmentStatus::Qualifies
        } else {
            EstablishmentStatus::Disqualifies
        })
    }
}
