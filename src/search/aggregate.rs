//! AssociationAggregator - ordered architect lists per building / 建築家集約
//!
//! Primary path: the repository returns one row per (building, credited
//! individual), already ordered by (architect_order, order_index), and the
//! rows are grouped in memory. No string concatenation involved.
//!
//! Legacy path: the old table stores parallel delimiter-joined strings
//! (names, translated names, ids, slugs). Splitting tolerates missing or
//! shorter lists by falling back per index, never by shifting positions:
//! index alignment across the lists is the invariant, not mere
//! non-emptiness.

use crate::models::{ArchitectLinkRow, ArchitectRef};
use std::collections::HashMap;

/// Separator between credited names in the legacy columns / 名前区切り
pub const NAME_SEPARATOR: &str = " / ";
/// Separator between ids and slugs in the legacy columns / リスト区切り
pub const LIST_SEPARATOR: char = ',';

/// Group pre-ordered join rows by building id. The input ordering is the
/// credit ordering and is preserved as-is; this function never re-sorts,
/// in particular not by name.
pub fn group_architect_rows(rows: Vec<ArchitectLinkRow>) -> HashMap<i64, Vec<ArchitectRef>> {
    let mut grouped: HashMap<i64, Vec<ArchitectRef>> = HashMap::new();

    for row in rows {
        let name_native = row.name_ja;
        let name_translated = row
            .name_en
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| name_native.clone());

        grouped.entry(row.building_id).or_default().push(ArchitectRef {
            architect_id: row.individual_architect_id,
            name_native,
            name_translated,
            slug: row.slug.unwrap_or_default(),
        });
    }

    grouped
}

/// Result of a legacy split, with the degradation marker.
#[derive(Debug, Clone, Default)]
pub struct AggregatedArchitects {
    pub architects: Vec<ArchitectRef>,
    /// True when one parallel list disagreed on the party count; the
    /// result was truncated or padded to the native-name count.
    pub length_mismatch: bool,
}

/// Split the legacy parallel lists into one aligned architect list.
///
/// The native-name list is canonical; each auxiliary list contributes at
/// the same index or falls back (translated -> native name, id -> 0,
/// slug -> empty). Out-of-bounds access is impossible by construction.
pub fn split_parallel_lists(
    names_native: Option<&str>,
    names_translated: Option<&str>,
    ids: Option<&str>,
    slugs: Option<&str>,
) -> AggregatedArchitects {
    let native: Vec<String> = match names_native {
        Some(raw) if !raw.trim().is_empty() => raw
            .split(NAME_SEPARATOR)
            .map(|s| s.trim().to_string())
            .collect(),
        _ => return AggregatedArchitects::default(),
    };

    let translated = split_list(names_translated, NAME_SEPARATOR);
    let id_list: Vec<i64> = split_list_char(ids)
        .iter()
        .map(|s| s.parse::<i64>().unwrap_or(0))
        .collect();
    let slug_list = split_list_char(slugs);

    let mut length_mismatch = false;
    for (label, len) in [
        ("translated names", translated.len()),
        ("ids", id_list.len()),
        ("slugs", slug_list.len()),
    ] {
        if len != 0 && len != native.len() {
            length_mismatch = true;
            tracing::warn!(
                "architect list mismatch: {} native names vs {} {}",
                native.len(),
                len,
                label
            );
        }
    }

    let architects = native
        .iter()
        .enumerate()
        .map(|(i, name)| ArchitectRef {
            architect_id: id_list.get(i).copied().unwrap_or(0),
            name_native: name.clone(),
            name_translated: translated
                .get(i)
                .filter(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| name.clone()),
            slug: slug_list.get(i).cloned().unwrap_or_default(),
        })
        .collect();

    AggregatedArchitects {
        architects,
        length_mismatch,
    }
}

fn split_list(raw: Option<&str>, separator: &str) -> Vec<String> {
    match raw {
        Some(s) if !s.trim().is_empty() => {
            s.split(separator).map(|p| p.trim().to_string()).collect()
        }
        _ => Vec::new(),
    }
}

fn split_list_char(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(s) if !s.trim().is_empty() => s
            .split(LIST_SEPARATOR)
            .map(|p| p.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}
