//! In-memory tooth record store
//!
//! Holds the chart snapshot supplied by the clinical-data collaborator.
//! A missing record means a healthy tooth; out-of-range numbers never make
//! it into the store.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::record::{ToothRecord, TreatmentEntry};
use super::tooth::ToothNumber;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToothRecordStore {
    records: BTreeMap<ToothNumber, ToothRecord>,
}

/// Record as it arrives from outside, before the number is validated
#[derive(Debug, Deserialize)]
struct InboundRecord {
    number: i64,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

/// Accepted snapshot shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InboundSnapshot {
    List(Vec<serde_json::Value>),
    Keyed(BTreeMap<String, serde_json::Value>),
}

impl ToothRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw (number, record) pairs, skipping invalid numbers
    pub fn from_snapshot(records: impl IntoIterator<Item = (u8, ToothRecord)>) -> Self {
        let mut store = Self::new();
        for (number, record) in records {
            store.set(number, record);
        }
        store
    }

    /// Parse a JSON snapshot: either an array of records or an object keyed by
    /// tooth number. Individual bad entries are logged and skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: InboundSnapshot =
            serde_json::from_str(json).context("Failed to parse chart snapshot JSON")?;

        let entries: Vec<serde_json::Value> = match snapshot {
            InboundSnapshot::List(values) => values,
            InboundSnapshot::Keyed(map) => map
                .into_iter()
                .map(|(key, mut value)| {
                    // The key is authoritative over any embedded number
                    match key.trim().parse::<i64>() {
                        Ok(n) => {
                            if let Some(obj) = value.as_object_mut() {
                                if let Some(embedded) = obj.get("number")
                                    && embedded.as_i64() != Some(n)
                                {
                                    debug!(key = %key, embedded = %embedded, "Record number disagrees with key, re-keying");
                                }
                                obj.insert("number".to_string(), n.into());
                            }
                        }
                        Err(_) => {
                            warn!(key = %key, "Snapshot key is not a tooth number, using the embedded number");
                        }
                    }
                    value
                })
                .collect(),
        };

        let mut store = Self::new();
        let mut skipped = 0usize;
        for value in entries {
            match Self::parse_inbound(value) {
                Some((number, record)) => {
                    store.set(number, record);
                }
                None => skipped += 1,
            }
        }

        info!(records = store.len(), skipped = skipped, "Loaded chart snapshot");
        Ok(store)
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chart snapshot from {:?}", path))?;
        Self::from_json(&contents).with_context(|| format!("Invalid chart snapshot in {:?}", path))
    }

    fn parse_inbound(value: serde_json::Value) -> Option<(u8, ToothRecord)> {
        let inbound: InboundRecord = match serde_json::from_value(value) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "Skipping malformed tooth record");
                return None;
            }
        };

        let Some(number) = u8::try_from(inbound.number).ok().and_then(ToothNumber::new) else {
            warn!(tooth = inbound.number, "Ignoring record for tooth outside 1-32");
            return None;
        };

        let mut fields = inbound.rest;
        fields.insert("number".to_string(), number.get().into());
        match serde_json::from_value::<ToothRecord>(serde_json::Value::Object(fields)) {
            Ok(record) => Some((number.get(), record)),
            Err(e) => {
                warn!(tooth = number.get(), error = %e, "Skipping malformed tooth record");
                None
            }
        }
    }

    /// Stored record, or a healthy default when the tooth has none
    pub fn get(&self, number: ToothNumber) -> Cow<'_, ToothRecord> {
        match self.records.get(&number) {
            Some(record) => Cow::Borrowed(record),
            None => Cow::Owned(ToothRecord::healthy(number)),
        }
    }

    /// Stored record only
    pub fn record(&self, number: ToothNumber) -> Option<&ToothRecord> {
        self.records.get(&number)
    }

    pub fn contains(&self, number: ToothNumber) -> bool {
        self.records.contains_key(&number)
    }

    /// Store a record. Numbers outside 1-32 are ignored and reported through
    /// the return value; the record is re-keyed to `number` if it disagrees.
    pub fn set(&mut self, number: u8, mut record: ToothRecord) -> bool {
        let Some(tooth) = ToothNumber::new(number) else {
            warn!(tooth = number, "Ignoring record for tooth outside 1-32");
            return false;
        };

        if record.number != tooth {
            debug!(key = number, embedded = record.number.get(), "Record number disagrees with key, re-keying");
            record.number = tooth;
        }
        self.records.insert(tooth, record);
        true
    }

    pub fn remove(&mut self, number: ToothNumber) -> Option<ToothRecord> {
        self.records.remove(&number)
    }

    /// Add or update a treatment on a tooth, creating the record if needed
    pub fn upsert_treatment(&mut self, number: ToothNumber, entry: TreatmentEntry) {
        self.records
            .entry(number)
            .or_insert_with(|| ToothRecord::healthy(number))
            .upsert_treatment(entry);
    }

    pub fn outstanding_treatments(&self, number: ToothNumber) -> usize {
        self.records.get(&number).map_or(0, |r| r.outstanding_treatments())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToothRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
