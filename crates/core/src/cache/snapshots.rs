//! Response snapshot CRUD operations.
//!
//! Provides functions for storing, matching, enumerating, and deleting
//! cached responses within a single generation.

use super::connection::CacheDb;
use crate::Error;
use crate::request::RequestKey;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Transaction};

/// A stored copy of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Bytes this snapshot occupies against the budget: body plus header names and values.
    pub fn size_bytes(&self) -> u64 {
        let headers: usize = self.headers.iter().map(|(n, v)| n.len() + v.len()).sum();
        (self.body.len() + headers) as u64
    }
}

/// Entry listing row, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub seq: i64,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size_bytes: u64,
    pub stored_at: String,
}

fn insert_entry(
    tx: &Transaction<'_>, generation: &str, key: &RequestKey, response: &ResponseSnapshot, stored_at: &str,
) -> Result<(), Error> {
    let key_hash = key.hash();
    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;

    tx.execute(
        "DELETE FROM entries WHERE generation = ?1 AND key_hash = ?2",
        params![generation, &key_hash],
    )?;
    tx.execute(
        "INSERT INTO entries (
            generation, key_hash, method, url, status, headers_json, body, size_bytes, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            generation,
            &key_hash,
            &key.method,
            &key.url,
            response.status as i64,
            &headers_json,
            &response.body,
            response.size_bytes() as i64,
            stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response under `key`, creating the generation if needed.
    ///
    /// An existing entry for the same key is replaced and moves to the end
    /// of the insertion order.
    pub async fn put_entry(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.put_entries(generation, vec![(key.clone(), response.clone())]).await
    }

    /// Store several responses in one transaction, in the given order.
    ///
    /// Either every entry is written or none is.
    pub async fn put_entries(
        &self, generation: &str, entries: Vec<(RequestKey, ResponseSnapshot)>,
    ) -> Result<(), Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let stored_at = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&generation, &stored_at],
                )?;
                for (key, response) in &entries {
                    insert_entry(&tx, &generation, key, response, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Match a request identity in one generation.
    ///
    /// Returns None if the key (or the generation) doesn't exist.
    pub async fn lookup_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn
                    .prepare("SELECT status, headers_json, body FROM entries WHERE generation = ?1 AND key_hash = ?2")?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
                });

                match result {
                    Ok((status, headers_json, body)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
                        let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
                        Ok(Some(ResponseSnapshot { status, headers, body }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry by key hash.
    ///
    /// Returns whether a row was removed.
    pub async fn delete_entry(&self, generation: &str, key_hash: &str) -> Result<bool, Error> {
        let generation = generation.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![generation, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List a generation's entries in insertion order.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<EntryMeta>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT seq, key_hash, method, url, status, size_bytes, stored_at
                     FROM entries WHERE generation = ?1 ORDER BY seq ASC",
                )?;

                let rows = stmt.query_map(params![generation], |row| {
                    Ok(EntryMeta {
                        seq: row.get(0)?,
                        key_hash: row.get(1)?,
                        method: row.get(2)?,
                        url: row.get(3)?,
                        status: row.get::<_, i64>(4)? as u16,
                        size_bytes: row.get::<_, i64>(5)? as u64,
                        stored_at: row.get(6)?,
                    })
                })?;

                let entries = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}
