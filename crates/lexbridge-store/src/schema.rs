//! Arrow schema for the vector collection and conversion between
//! [`LegalDocument`] records and RecordBatches.
//!
//! Each row is one indexed point: the document id, the embedding vector,
//! and a payload mirror of the document's scalar fields. Search results are
//! reconstructed into documents from the payload alone, without a second
//! lookup.

use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Date32Array, Date32Builder, FixedSizeListArray, FixedSizeListBuilder,
    Float32Array, Float32Builder, LargeStringArray, LargeStringBuilder, ListArray, ListBuilder,
    StringArray, StringBuilder, TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use lexbridge_core::{CourtLevel, DocumentType, Jurisdiction, LegalDocument};

use crate::StoreError;

/// Schema of the vector collection for the given embedding dimension.
pub fn collection_schema(dim: i32) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("jurisdiction", DataType::Utf8, false),
        Field::new("sub_jurisdiction", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, false),
        Field::new("text", DataType::LargeUtf8, false),
        Field::new("source_url", DataType::Utf8, false),
        Field::new("published_at", DataType::Date32, true),
        Field::new("doc_type", DataType::Utf8, false),
        Field::new("court_level", DataType::Utf8, true),
        Field::new("language", DataType::Utf8, false),
        Field::new(
            "tags",
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            true,
        ),
        Field::new(
            "embedding",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            false,
        ),
        Field::new("embedding_model", DataType::Utf8, true),
        Field::new(
            "indexed_at",
            DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
            true,
        ),
    ]))
}

/// Build one RecordBatch from embedded documents.
///
/// Every document must carry an embedding of exactly `dim` values.
pub fn documents_to_batch(
    docs: &[LegalDocument],
    dim: i32,
    embedding_model: &str,
) -> Result<RecordBatch, StoreError> {
    let n = docs.len();

    let mut doc_id = StringBuilder::new();
    let mut jurisdiction = StringBuilder::new();
    let mut sub_jurisdiction = StringBuilder::new();
    let mut title = StringBuilder::new();
    let mut text = LargeStringBuilder::new();
    let mut source_url = StringBuilder::new();
    let mut published_at = Date32Builder::new();
    let mut doc_type = StringBuilder::new();
    let mut court_level = StringBuilder::new();
    let mut language = StringBuilder::new();
    let mut tags = ListBuilder::new(StringBuilder::new());
    let mut embedding = FixedSizeListBuilder::new(Float32Builder::new(), dim);

    for doc in docs {
        let vector = doc
            .embedding
            .as_ref()
            .ok_or_else(|| StoreError::MissingEmbedding(doc.doc_id.clone()))?;
        if vector.len() != dim as usize {
            return Err(StoreError::DimensionMismatch {
                doc_id: doc.doc_id.clone(),
                got: vector.len(),
                expected: dim as usize,
            });
        }

        doc_id.append_value(&doc.doc_id);
        jurisdiction.append_value(doc.jurisdiction.as_str());
        sub_jurisdiction.append_option(doc.sub_jurisdiction.as_deref());
        title.append_value(&doc.title);
        text.append_value(&doc.text);
        source_url.append_value(&doc.source_url);
        published_at.append_option(doc.published_at.map(date_to_epoch_days));
        doc_type.append_value(doc.doc_type.as_str());
        court_level.append_option(doc.court_level.map(|c| c.as_str()));
        language.append_value(&doc.language);

        for tag in &doc.tags {
            tags.values().append_value(tag);
        }
        tags.append(true);

        for &value in vector {
            embedding.values().append_value(value);
        }
        embedding.append(true);
    }

    let now_nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(doc_id.finish()),
        Arc::new(jurisdiction.finish()),
        Arc::new(sub_jurisdiction.finish()),
        Arc::new(title.finish()),
        Arc::new(text.finish()),
        Arc::new(source_url.finish()),
        Arc::new(published_at.finish()),
        Arc::new(doc_type.finish()),
        Arc::new(court_level.finish()),
        Arc::new(language.finish()),
        Arc::new(tags.finish()),
        Arc::new(embedding.finish()),
        Arc::new(StringArray::from(vec![embedding_model; n])),
        Arc::new(TimestampNanosecondArray::from(vec![now_nanos; n]).with_timezone("UTC")),
    ];

    Ok(RecordBatch::try_new(collection_schema(dim), columns)?)
}

/// Reconstruct documents from a search-result batch.
///
/// Reads the payload columns by name, so extra result columns such as
/// `_distance` are tolerated.
pub fn batch_to_documents(batch: &RecordBatch) -> Result<Vec<LegalDocument>, StoreError> {
    let mut docs = Vec::with_capacity(batch.num_rows());

    for row in 0..batch.num_rows() {
        let doc_id = required_string(batch, "doc_id", row)?;
        let jurisdiction = Jurisdiction::from_str(&required_string(batch, "jurisdiction", row)?)
            .map_err(|e| StoreError::Other(e.to_string()))?;
        let doc_type = DocumentType::from_str(&required_string(batch, "doc_type", row)?)
            .map_err(|e| StoreError::Other(e.to_string()))?;
        let court_level = match optional_string(batch, "court_level", row) {
            Some(s) => Some(CourtLevel::from_str(&s).map_err(|e| StoreError::Other(e.to_string()))?),
            None => None,
        };

        docs.push(LegalDocument {
            doc_id,
            jurisdiction,
            sub_jurisdiction: optional_string(batch, "sub_jurisdiction", row),
            title: required_string(batch, "title", row)?,
            text: required_string(batch, "text", row)?,
            source_url: required_string(batch, "source_url", row)?,
            published_at: date_value(batch, "published_at", row),
            doc_type,
            court_level,
            language: required_string(batch, "language", row)?,
            tags: tag_values(batch, row),
            embedding: embedding_value(batch, row),
        });
    }

    Ok(docs)
}

// ── Column helpers ──

/// Read a string cell from a `Utf8` or `LargeUtf8` column. `None` on a
/// missing column or a null cell.
fn string_cell(batch: &RecordBatch, name: &str, row: usize) -> Option<String> {
    let col = batch.column_by_name(name)?;
    if col.is_null(row) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        Some(arr.value(row).to_string())
    } else if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        Some(arr.value(row).to_string())
    } else {
        None
    }
}

fn required_string(batch: &RecordBatch, name: &str, row: usize) -> Result<String, StoreError> {
    string_cell(batch, name, row)
        .ok_or_else(|| StoreError::Other(format!("missing '{name}' at row {row}")))
}

fn optional_string(batch: &RecordBatch, name: &str, row: usize) -> Option<String> {
    string_cell(batch, name, row)
}

fn date_value(batch: &RecordBatch, name: &str, row: usize) -> Option<NaiveDate> {
    let col = batch.column_by_name(name)?;
    if col.is_null(row) {
        return None;
    }
    let arr = col.as_any().downcast_ref::<Date32Array>()?;
    epoch_days_to_date(arr.value(row))
}

fn tag_values(batch: &RecordBatch, row: usize) -> Vec<String> {
    let Some(col) = batch.column_by_name("tags") else {
        return Vec::new();
    };
    if col.is_null(row) {
        return Vec::new();
    }
    let Some(list) = col.as_any().downcast_ref::<ListArray>() else {
        return Vec::new();
    };
    let values = list.value(row);
    let Some(strings) = values.as_any().downcast_ref::<StringArray>() else {
        return Vec::new();
    };
    (0..strings.len())
        .filter(|&i| !strings.is_null(i))
        .map(|i| strings.value(i).to_string())
        .collect()
}

fn embedding_value(batch: &RecordBatch, row: usize) -> Option<Vec<f32>> {
    let col = batch.column_by_name("embedding")?;
    if col.is_null(row) {
        return None;
    }
    let list = col.as_any().downcast_ref::<FixedSizeListArray>()?;
    let values = list.value(row);
    let floats = values.as_any().downcast_ref::<Float32Array>()?;
    Some((0..floats.len()).map(|i| floats.value(i)).collect())
}

fn date_to_epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    epoch.checked_add_signed(chrono::Duration::days(days as i64))
}
