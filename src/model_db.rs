use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::{Error, Result};

const DOC_VECTORS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("doc_vectors");
const WORD_VECTORS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("word_vectors");
const META: TableDefinition<&str, &str> = TableDefinition::new("meta");

/// Persists a trained paragraph-vector model in a single redb file.
///
/// Vector values are raw little-endian f32 bytes; the dimension is recorded
/// once under the `dimension` meta key and validated against value length
/// on every load.
pub struct ModelDb {
    db: Database,
}

impl ModelDb {
    /// Open or create a model database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(DOC_VECTORS)?;
        txn.open_table(WORD_VECTORS)?;
        txn.open_table(META)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Meta --

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(META)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(META)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    // -- Document vectors --

    /// Store document vectors in a single write transaction.
    pub fn store_doc_vectors(&self, entries: &[(&str, &[f32])]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOC_VECTORS)?;
            for (tag, data) in entries {
                table.insert(*tag, bytemuck::cast_slice::<f32, u8>(data))?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Retrieve one document vector, validating its length.
    pub fn doc_vector(
        &self,
        tag: &str,
        dimension: usize,
    ) -> Result<Option<Vec<f32>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOC_VECTORS)?;

        let Some(guard) = table.get(tag)? else {
            return Ok(None);
        };
        Ok(Some(decode_vector(guard.value(), dimension, "tag", tag)?))
    }

    /// All (tag, vector) pairs, in key order.
    pub fn all_doc_vectors(
        &self,
        dimension: usize,
    ) -> Result<Vec<(String, Vec<f32>)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOC_VECTORS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            let tag = k.value().to_string();
            let vector = decode_vector(v.value(), dimension, "tag", &tag)?;
            result.push((tag, vector));
        }
        Ok(result)
    }

    /// All stored document tags, in key order.
    pub fn list_tags(&self) -> Result<Vec<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOC_VECTORS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, _) = entry?;
            result.push(k.value().to_string());
        }
        Ok(result)
    }

    /// Number of stored document vectors.
    pub fn doc_count(&self) -> Result<usize> {
        Ok(self.list_tags()?.len())
    }

    // -- Word output vectors --

    /// Store word output vectors in a single write transaction.
    pub fn store_word_vectors(
        &self,
        entries: &[(&str, &[f32])],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(WORD_VECTORS)?;
            for (word, data) in entries {
                table.insert(*word, bytemuck::cast_slice::<f32, u8>(data))?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// All (word, vector) pairs, in key order.
    pub fn all_word_vectors(
        &self,
        dimension: usize,
    ) -> Result<Vec<(String, Vec<f32>)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(WORD_VECTORS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            let word = k.value().to_string();
            let vector = decode_vector(v.value(), dimension, "word", &word)?;
            result.push((word, vector));
        }
        Ok(result)
    }
}

impl std::fmt::Debug for ModelDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDb").finish_non_exhaustive()
    }
}

fn decode_vector(
    bytes: &[u8],
    dimension: usize,
    kind: &str,
    name: &str,
) -> Result<Vec<f32>> {
    if bytes.len() != dimension * size_of::<f32>() {
        return Err(Error::Config(format!(
            "stored vector for {kind} '{name}' has {} bytes, expected {} \
             for dimension {dimension}",
            bytes.len(),
            dimension * size_of::<f32>(),
        )));
    }
    // pod_collect_to_vec copies, so unaligned database pages are fine.
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, ModelDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = ModelDb::open(&tmp.path().join("model.redb")).unwrap();
        (tmp, db)
    }

    #[test]
    fn store_and_load_doc_vector() {
        let (_tmp, db) = test_db();

        let v: Vec<f32> = vec![0.1, 0.2, 0.3, 0.4];
        db.store_doc_vectors(&[("A_0", v.as_slice())]).unwrap();

        let loaded = db.doc_vector("A_0", 4).unwrap().unwrap();
        assert_eq!(loaded, v);
    }

    #[test]
    fn missing_vector_returns_none() {
        let (_tmp, db) = test_db();
        assert!(db.doc_vector("ghost", 4).unwrap().is_none());
    }

    #[test]
    fn wrong_dimension_is_config_error() {
        let (_tmp, db) = test_db();

        db.store_doc_vectors(&[("A_0", [1.0f32, 2.0].as_slice())])
            .unwrap();
        assert!(matches!(
            db.doc_vector("A_0", 4),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn batch_store_and_count() {
        let (_tmp, db) = test_db();

        let a = [1.0f32, 2.0];
        let b = [3.0f32, 4.0];
        db.store_doc_vectors(&[("A_0", a.as_slice()), ("A_1", b.as_slice())])
            .unwrap();

        assert_eq!(db.doc_count().unwrap(), 2);
        assert_eq!(db.list_tags().unwrap(), vec!["A_0", "A_1"]);

        let all = db.all_doc_vectors(2).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].1, vec![1.0, 2.0]);
    }

    #[test]
    fn word_vectors_round_trip() {
        let (_tmp, db) = test_db();

        let v = [0.5f32, -0.5];
        db.store_word_vectors(&[("movie", v.as_slice())]).unwrap();

        let all = db.all_word_vectors(2).unwrap();
        assert_eq!(all, vec![("movie".to_string(), vec![0.5, -0.5])]);
    }

    #[test]
    fn meta_round_trip() {
        let (_tmp, db) = test_db();

        assert_eq!(db.get_meta("dimension").unwrap(), None);
        db.set_meta("dimension", "100").unwrap();
        assert_eq!(
            db.get_meta("dimension").unwrap(),
            Some("100".to_string())
        );
    }

    #[test]
    fn overwrite_replaces_vector() {
        let (_tmp, db) = test_db();

        db.store_doc_vectors(&[("A_0", [1.0f32, 2.0].as_slice())])
            .unwrap();
        db.store_doc_vectors(&[("A_0", [9.0f32, 8.0].as_slice())])
            .unwrap();

        assert_eq!(
            db.doc_vector("A_0", 2).unwrap().unwrap(),
            vec![9.0, 8.0]
        );
        assert_eq!(db.doc_count().unwrap(), 1);
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("model.redb");

        {
            let db = ModelDb::open(&path).unwrap();
            db.store_doc_vectors(&[("A_0", [1.0f32, 2.0].as_slice())])
                .unwrap();
            db.set_meta("dimension", "2").unwrap();
        }

        {
            let db = ModelDb::open(&path).unwrap();
            assert_eq!(
                db.doc_vector("A_0", 2).unwrap().unwrap(),
                vec![1.0, 2.0]
            );
            assert_eq!(
                db.get_meta("dimension").unwrap(),
                Some("2".to_string())
            );
        }
    }
}
