//! # SQLite
//!
//! Relational store for words and their relations.
//!
//! ## Schema
//! - `vocabulary`: id, word, nullable phonetic/definition, creation timestamp
//! - `vocabulary_relation`: id, `(vocabulary_id, related_id)` unique, both foreign keyed to `vocabulary`
//!
//! ## Notes
//! - Ids are UUID v4 strings, timestamps are RFC 3339 UTC
//! - Foreign keys are enforced, so a relation never outlives either side
//! - Relation upserts lean on the compound unique key, concurrent writers cannot duplicate a pair
//! - Deleting a word removes every relation touching it first, inside one transaction
use std::collections::HashSet;

use chrono::Utc;
use models::{RelatedFrom, RelatedWord, Relation, VocabularyEntry};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS vocabulary (
        id TEXT PRIMARY KEY NOT NULL,
        word TEXT NOT NULL,
        phonetic TEXT,
        definition TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vocabulary_relation (
        id TEXT PRIMARY KEY NOT NULL,
        vocabulary_id TEXT NOT NULL REFERENCES vocabulary(id),
        related_id TEXT NOT NULL REFERENCES vocabulary(id),
        UNIQUE (vocabulary_id, related_id)
    );

    CREATE INDEX IF NOT EXISTS idx_relation_related ON vocabulary_relation(related_id);
"#;

const ENTRY_COLUMNS: &str = "id, word, phonetic, definition";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        conn.execute_batch(SCHEMA)?;
        info!("Database ready at {path}");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, AppError> {
        Self::open(":memory:")
    }

    pub fn create_entry(
        &self,
        word: &str,
        phonetic: Option<&str>,
        definition: Option<&str>,
    ) -> Result<VocabularyEntry, AppError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(AppError::validation("word is required"));
        }

        let entry = VocabularyEntry {
            id: Uuid::new_v4().to_string(),
            word: word.to_string(),
            phonetic: phonetic.map(str::to_string),
            definition: definition.map(str::to_string),
        };

        self.conn.lock().execute(
            "INSERT INTO vocabulary (id, word, phonetic, definition, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.word,
                entry.phonetic,
                entry.definition,
                Utc::now().to_rfc3339()
            ],
        )?;

        debug!("Created entry {} ({})", entry.word, entry.id);
        Ok(entry)
    }

    pub fn get_entry(&self, id: &str) -> Result<VocabularyEntry, AppError> {
        let conn = self.conn.lock();
        find_entry(&conn, id)?.ok_or(AppError::NotFound)
    }

    /// Newest first.
    pub fn list_entries(&self) -> Result<Vec<VocabularyEntry>, AppError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM vocabulary ORDER BY created_at DESC, rowid DESC"
        ))?;

        let entries = statement
            .query_map([], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn similar_words(&self, id: &str) -> Result<Vec<RelatedWord>, AppError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(
            "SELECT r.id, r.vocabulary_id, r.related_id, v.id, v.word, v.phonetic, v.definition
             FROM vocabulary_relation r
             JOIN vocabulary v ON v.id = r.related_id
             WHERE r.vocabulary_id = ?1
             ORDER BY r.rowid",
        )?;

        let words = statement
            .query_map([id], |row| {
                Ok(RelatedWord {
                    id: row.get(0)?,
                    vocabulary_id: row.get(1)?,
                    related_id: row.get(2)?,
                    related: entry_at(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }

    /// Words that list `id` as similar.
    pub fn related_from(&self, id: &str) -> Result<Vec<RelatedFrom>, AppError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(
            "SELECT r.id, r.vocabulary_id, r.related_id, v.id, v.word, v.phonetic, v.definition
             FROM vocabulary_relation r
             JOIN vocabulary v ON v.id = r.vocabulary_id
             WHERE r.related_id = ?1
             ORDER BY r.rowid",
        )?;

        let words = statement
            .query_map([id], |row| {
                Ok(RelatedFrom {
                    id: row.get(0)?,
                    vocabulary_id: row.get(1)?,
                    related_id: row.get(2)?,
                    vocabulary: entry_at(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }

    pub fn get_relation(&self, id: &str) -> Result<Relation, AppError> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, vocabulary_id, related_id FROM vocabulary_relation WHERE id = ?1",
                [id],
                relation_from_row,
            )
            .optional()?
            .ok_or(AppError::NotFound)
    }

    pub fn find_relation(
        &self,
        vocabulary_id: &str,
        related_id: &str,
    ) -> Result<Option<Relation>, AppError> {
        let relation = self
            .conn
            .lock()
            .query_row(
                "SELECT id, vocabulary_id, related_id FROM vocabulary_relation
                 WHERE vocabulary_id = ?1 AND related_id = ?2",
                [vocabulary_id, related_id],
                relation_from_row,
            )
            .optional()?;

        Ok(relation)
    }

    /// Creates the pair when absent, deletes it by compound key when present.
    /// Returns whether the pair is linked afterwards.
    pub fn toggle_relation(&self, vocabulary_id: &str, related_id: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        check_pair(&tx, vocabulary_id, related_id)?;

        let removed = tx.execute(
            "DELETE FROM vocabulary_relation WHERE vocabulary_id = ?1 AND related_id = ?2",
            [vocabulary_id, related_id],
        )?;

        if removed == 0 {
            insert_relation(&tx, vocabulary_id, related_id)?;
        }

        tx.commit()?;
        Ok(removed == 0)
    }

    /// Batch upsert. Already linked pairs are left untouched and nothing is
    /// written when any pair is invalid.
    pub fn upsert_relations(
        &self,
        vocabulary_id: &str,
        related_ids: &[String],
    ) -> Result<usize, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut inserted = 0;
        for related_id in related_ids {
            check_pair(&tx, vocabulary_id, related_id)?;
            inserted += insert_relation(&tx, vocabulary_id, related_id)?;
        }

        tx.commit()?;

        debug!(
            "Upserted {} relations for {vocabulary_id}, {inserted} new",
            related_ids.len()
        );
        Ok(inserted)
    }

    pub fn delete_relation(&self, id: &str) -> Result<(), AppError> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM vocabulary_relation WHERE id = ?1", [id])?;

        match deleted {
            0 => Err(AppError::NotFound),
            _ => Ok(()),
        }
    }

    /// Removes relations on either side, then the entry, all or nothing.
    pub fn delete_entry(&self, id: &str) -> Result<usize, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        if find_entry(&tx, id)?.is_none() {
            return Err(AppError::NotFound);
        }

        let relations = tx.execute(
            "DELETE FROM vocabulary_relation WHERE vocabulary_id = ?1 OR related_id = ?1",
            [id],
        )?;
        tx.execute("DELETE FROM vocabulary WHERE id = ?1", [id])?;

        tx.commit()?;

        info!("Deleted entry {id} and {relations} relations");
        Ok(relations)
    }

    /// Case-insensitive substring match on the word, ascending by word.
    pub fn search(
        &self,
        query: &str,
        exclude: &HashSet<String>,
    ) -> Result<Vec<VocabularyEntry>, AppError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut statement = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM vocabulary ORDER BY word ASC"
        ))?;

        let mut matches = Vec::new();
        for entry in statement.query_map([], entry_from_row)? {
            let entry = entry?;
            if !exclude.contains(&entry.id) && entry.word.to_lowercase().contains(&needle) {
                matches.push(entry);
            }
        }

        Ok(matches)
    }
}

fn find_entry(conn: &Connection, id: &str) -> Result<Option<VocabularyEntry>, AppError> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM vocabulary WHERE id = ?1"),
            [id],
            entry_from_row,
        )
        .optional()?;

    Ok(entry)
}

fn check_pair(conn: &Connection, vocabulary_id: &str, related_id: &str) -> Result<(), AppError> {
    if vocabulary_id == related_id {
        return Err(AppError::validation("a word cannot be related to itself"));
    }

    for id in [vocabulary_id, related_id] {
        if find_entry(conn, id)?.is_none() {
            return Err(AppError::NotFound);
        }
    }

    Ok(())
}

fn insert_relation(
    conn: &Connection,
    vocabulary_id: &str,
    related_id: &str,
) -> Result<usize, AppError> {
    let inserted = conn.execute(
        "INSERT INTO vocabulary_relation (id, vocabulary_id, related_id) VALUES (?1, ?2, ?3)
         ON CONFLICT (vocabulary_id, related_id) DO NOTHING",
        params![Uuid::new_v4().to_string(), vocabulary_id, related_id],
    )?;

    Ok(inserted)
}

fn entry_from_row(row: &Row) -> rusqlite::Result<VocabularyEntry> {
    entry_at(row, 0)
}

fn entry_at(row: &Row, offset: usize) -> rusqlite::Result<VocabularyEntry> {
    Ok(VocabularyEntry {
        id: row.get(offset)?,
        word: row.get(offset + 1)?,
        phonetic: row.get(offset + 2)?,
        definition: row.get(offset + 3)?,
    })
}

fn relation_from_row(row: &Row) -> rusqlite::Result<Relation> {
    Ok(Relation {
        id: row.get(0)?,
        vocabulary_id: row.get(1)?,
        related_id: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(db: &Database, word: &str) -> VocabularyEntry {
        db.create_entry(word, None, Some("a definition")).unwrap()
    }

    fn ids(entries: &[VocabularyEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.word.as_str()).collect()
    }

    #[test]
    fn test_create_requires_word() {
        let db = Database::in_memory().unwrap();

        assert!(matches!(
            db.create_entry("   ", None, None),
            Err(AppError::ValidationFailure(_))
        ));
        assert!(db.list_entries().unwrap().is_empty());
    }

    #[test]
    fn test_get_missing_entry() {
        let db = Database::in_memory().unwrap();

        assert!(matches!(db.get_entry("nope"), Err(AppError::NotFound)));
    }

    #[test]
    fn test_list_newest_first() {
        let db = Database::in_memory().unwrap();
        add(&db, "first");
        add(&db, "second");
        add(&db, "third");

        assert_eq!(ids(&db.list_entries().unwrap()), ["third", "second", "first"]);
    }

    #[test]
    fn test_search_case_insensitive_sorted_excluding() {
        let db = Database::in_memory().unwrap();
        let run = add(&db, "Run");
        add(&db, "rerun");
        add(&db, "jog");
        add(&db, "Brunch");

        let none = HashSet::new();
        assert_eq!(ids(&db.search("RUN", &none).unwrap()), ["Brunch", "Run", "rerun"]);

        let exclude = HashSet::from([run.id.clone()]);
        assert_eq!(ids(&db.search("run", &exclude).unwrap()), ["Brunch", "rerun"]);

        assert!(db.search("  ", &none).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let run = add(&db, "run");
        let jog = add(&db, "jog");

        assert_eq!(db.upsert_relations(&run.id, &[jog.id.clone()]).unwrap(), 1);
        assert_eq!(db.upsert_relations(&run.id, &[jog.id.clone()]).unwrap(), 0);

        assert_eq!(db.similar_words(&run.id).unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_rejects_self_and_unknown_without_writing() {
        let db = Database::in_memory().unwrap();
        let run = add(&db, "run");
        let jog = add(&db, "jog");

        let result = db.upsert_relations(&run.id, &[jog.id.clone(), run.id.clone()]);
        assert!(matches!(result, Err(AppError::ValidationFailure(_))));

        let result = db.upsert_relations(&run.id, &[jog.id.clone(), "ghost".to_string()]);
        assert!(matches!(result, Err(AppError::NotFound)));

        assert!(db.similar_words(&run.id).unwrap().is_empty());
    }

    #[test]
    fn test_toggle_relation() {
        let db = Database::in_memory().unwrap();
        let run = add(&db, "run");
        let jog = add(&db, "jog");

        assert!(db.toggle_relation(&run.id, &jog.id).unwrap());
        assert!(db.find_relation(&run.id, &jog.id).unwrap().is_some());

        assert!(!db.toggle_relation(&run.id, &jog.id).unwrap());
        assert!(db.find_relation(&run.id, &jog.id).unwrap().is_none());
    }

    #[test]
    fn test_similar_and_related_from() {
        let db = Database::in_memory().unwrap();
        let run = add(&db, "run");
        let jog = add(&db, "jog");
        let sprint = add(&db, "sprint");

        db.upsert_relations(&run.id, &[jog.id.clone(), sprint.id.clone()])
            .unwrap();
        db.upsert_relations(&sprint.id, &[jog.id.clone()]).unwrap();

        let similar = db.similar_words(&run.id).unwrap();
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].related.word, "jog");

        let from: Vec<String> = db
            .related_from(&jog.id)
            .unwrap()
            .into_iter()
            .map(|relation| relation.vocabulary.word)
            .collect();
        assert_eq!(from, ["run", "sprint"]);
    }

    #[test]
    fn test_delete_relation_by_id() {
        let db = Database::in_memory().unwrap();
        let run = add(&db, "run");
        let jog = add(&db, "jog");
        db.upsert_relations(&run.id, &[jog.id.clone()]).unwrap();

        let relation = db.find_relation(&run.id, &jog.id).unwrap().unwrap();
        db.delete_relation(&relation.id).unwrap();

        assert!(matches!(db.get_relation(&relation.id), Err(AppError::NotFound)));
        assert!(matches!(db.delete_relation(&relation.id), Err(AppError::NotFound)));
    }

    #[test]
    fn test_delete_cascades_both_sides() {
        let db = Database::in_memory().unwrap();
        let x = add(&db, "x");
        let y = add(&db, "y");
        let z = add(&db, "z");

        db.upsert_relations(&x.id, &[y.id.clone()]).unwrap();
        db.upsert_relations(&z.id, &[x.id.clone()]).unwrap();
        db.upsert_relations(&z.id, &[y.id.clone()]).unwrap();

        let outgoing = db.find_relation(&x.id, &y.id).unwrap().unwrap();
        let incoming = db.find_relation(&z.id, &x.id).unwrap().unwrap();

        assert_eq!(db.delete_entry(&x.id).unwrap(), 2);

        assert!(matches!(db.get_relation(&outgoing.id), Err(AppError::NotFound)));
        assert!(matches!(db.get_relation(&incoming.id), Err(AppError::NotFound)));
        assert!(matches!(db.get_entry(&x.id), Err(AppError::NotFound)));
        assert_eq!(db.similar_words(&z.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_entry() {
        let db = Database::in_memory().unwrap();

        assert!(matches!(db.delete_entry("ghost"), Err(AppError::NotFound)));
    }
}
