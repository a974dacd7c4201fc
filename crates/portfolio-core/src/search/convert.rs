//! Conversion of per-source index records into [`UnifiedEntry`].
//!
//! Each conversion sets exactly one provenance variant.

use portfolio_types::index::{CollectionIndexEntry, LocalIndexEntry, RemoteIndexEntry};
use portfolio_types::unified::{Provenance, UnifiedEntry};

pub fn convert_local_entry(entry: &LocalIndexEntry) -> UnifiedEntry {
    let meta = &entry.metadata;
    UnifiedEntry {
        name: meta.name.clone(),
        element_type: entry.element_type,
        description: meta.description.clone(),
        version: meta.version.clone(),
        author: meta.author.clone(),
        tags: meta.tags.clone(),
        last_modified: Some(entry.last_modified),
        provenance: Provenance::Local {
            file_path: entry.file_path.clone(),
        },
    }
}

pub fn convert_remote_entry(entry: &RemoteIndexEntry) -> UnifiedEntry {
    UnifiedEntry {
        name: entry.name.clone(),
        element_type: entry.element_type,
        description: entry.description.clone(),
        version: entry.version.clone(),
        author: entry.author.clone(),
        tags: Vec::new(),
        last_modified: Some(entry.last_modified),
        provenance: Provenance::GitHub {
            path: entry.path.clone(),
            sha: entry.sha.clone(),
        },
    }
}

pub fn convert_collection_entry(entry: &CollectionIndexEntry) -> UnifiedEntry {
    UnifiedEntry {
        name: entry.name.clone(),
        element_type: entry.element_type,
        description: entry.description.clone(),
        version: entry.version.clone(),
        author: entry.author.clone(),
        tags: entry.tags.clone(),
        last_modified: entry.created,
        provenance: Provenance::Collection {
            path: entry.path.clone(),
        },
    }
}
