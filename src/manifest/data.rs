//! Seed data entry validation

use std::path::Path;

use serde_yaml::Value;

use super::entry::{scalar_string, NamedEntry};
use super::{DataSpec, SeedFile};
use crate::common::paths::PathResolver;
use crate::common::{EntryKind, Error, Result};

/// Validate one element of a `data` list
///
/// `global_database` fills in a missing `database`. The raw value is left
/// untouched; the returned [`DataSpec`] carries the resolved file path.
pub fn validate_data_spec(
    value: &Value,
    position: &str,
    global_database: Option<&str>,
    base_dir: &Path,
    resolver: &dyn PathResolver,
) -> Result<DataSpec> {
    let entry = NamedEntry::decode(value, EntryKind::Data, position)?;
    let name = entry.name.as_str();

    let collection = entry.required_string("collection")?;
    if collection.trim().is_empty() {
        return Err(Error::shape(
            format!("{name}.collection"),
            format!("{name}.collection must not be empty"),
        ));
    }

    let database = match entry.field("database") {
        Some(value) => match scalar_string(value) {
            Some(db) if !db.trim().is_empty() => db,
            Some(_) => {
                return Err(Error::invalid_database(
                    EntryKind::Data,
                    name,
                    "the database name is empty",
                ))
            }
            None => {
                return Err(Error::invalid_database(
                    EntryKind::Data,
                    name,
                    "the database name must be a string",
                ))
            }
        },
        None => global_database
            .map(str::to_string)
            .ok_or_else(|| Error::missing_field(EntryKind::Data, name, "database"))?,
    };

    let file = resolve_file(&entry, base_dir, resolver)?;
    let strategy = entry.optional_string("strategy")?;

    Ok(DataSpec {
        name: entry.name.clone(),
        collection,
        database,
        file,
        strategy,
    })
}

fn resolve_file(
    entry: &NamedEntry,
    base_dir: &Path,
    resolver: &dyn PathResolver,
) -> Result<SeedFile> {
    const HINT: &str = "Specify a valid path or an empty object {}";
    let name = entry.name.as_str();

    let raw = entry
        .field("file")
        .ok_or_else(|| Error::missing_field(EntryKind::Data, name, "file"))?;

    match raw {
        Value::Mapping(map) if map.is_empty() => Ok(SeedFile::Skip),
        Value::Mapping(_) | Value::Sequence(_) => Err(Error::invalid_file_reference(
            EntryKind::Data,
            name,
            "file",
            &serde_yaml::to_string(raw)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            HINT,
        )),
        scalar => {
            let reference = scalar_string(scalar).unwrap_or_default();
            resolver
                .resolve(base_dir, &reference)
                .map(SeedFile::Path)
                .map_err(|e| {
                    let reason = match e {
                        Error::InvalidPath(_) => format!("{e}. {HINT}"),
                        other => other.to_string(),
                    };
                    Error::invalid_file_reference(EntryKind::Data, name, "file", &reference, reason)
                })
        }
    }
}
