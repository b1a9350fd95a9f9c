//! Consistency checks and parent-first ordering of snapshot folders.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use validator::ValidationError;

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::FolderId;
use promptdesk_entity::backup::snapshot::SNAPSHOT_FORMAT_VERSION;
use promptdesk_entity::backup::{BackupSnapshot, SnapshotFolder, SnapshotPrompt};

use crate::requests::{bounded_name, content_size, short_marker, well_formed_url};

/// Check everything about a snapshot that does not need the live store.
pub fn check_snapshot(snapshot: &BackupSnapshot) -> AppResult<()> {
    if snapshot.version > SNAPSHOT_FORMAT_VERSION {
        return Err(AppError::invalid_backup(format!(
            "Snapshot format version {} is newer than the supported version {SNAPSHOT_FORMAT_VERSION}",
            snapshot.version
        )));
    }

    for folder in &snapshot.folders {
        field_rule("folder", &folder.id, "name", bounded_name(&folder.name))?;
    }
    for prompt in &snapshot.prompts {
        check_prompt(prompt)?;
    }

    Ok(())
}

/// Apply the same field limits a create request is held to.
fn check_prompt(prompt: &SnapshotPrompt) -> AppResult<()> {
    field_rule("prompt", &prompt.id, "title", bounded_name(&prompt.title))?;
    field_rule("prompt", &prompt.id, "content", content_size(&prompt.content))?;
    if let Some(emoji) = &prompt.emoji {
        field_rule("prompt", &prompt.id, "emoji", short_marker(emoji))?;
    }
    if let Some(url) = &prompt.url {
        field_rule("prompt", &prompt.id, "url", well_formed_url(url))?;
    }
    Ok(())
}

fn field_rule(
    entity: &str,
    id: &dyn Display,
    field: &str,
    outcome: Result<(), ValidationError>,
) -> AppResult<()> {
    outcome.map_err(|err| {
        let reason = err.message.as_deref().unwrap_or(err.code.as_ref()).to_string();
        AppError::invalid_backup(format!(
            "Snapshot {entity} '{id}' has an invalid {field}: {reason}"
        ))
    })
}

/// Order snapshot folders so every parent precedes its children.
///
/// Depth is measured by walking each folder's parent chain inside the
/// snapshot. A parent that is not part of the snapshot, a duplicated id,
/// or a chain that loops makes the snapshot inconsistent. Folders of equal
/// depth keep their snapshot order.
pub fn order_by_depth(folders: &[SnapshotFolder]) -> AppResult<Vec<&SnapshotFolder>> {
    let mut by_id: HashMap<&FolderId, &SnapshotFolder> = HashMap::with_capacity(folders.len());
    for folder in folders {
        if by_id.insert(&folder.id, folder).is_some() {
            return Err(AppError::invalid_backup(format!(
                "Snapshot folder id '{}' appears more than once",
                folder.id
            )));
        }
    }

    let mut depths: HashMap<&FolderId, usize> = HashMap::with_capacity(folders.len());
    for folder in folders {
        let depth = depth_of(folder, &by_id, &depths)?;
        depths.insert(&folder.id, depth);
    }

    let mut ordered: Vec<&SnapshotFolder> = folders.iter().collect();
    ordered.sort_by_key(|folder| depths.get(&folder.id).copied().unwrap_or_default());
    Ok(ordered)
}

fn depth_of<'a>(
    folder: &'a SnapshotFolder,
    by_id: &HashMap<&'a FolderId, &'a SnapshotFolder>,
    known: &HashMap<&'a FolderId, usize>,
) -> AppResult<usize> {
    let mut seen: HashSet<&FolderId> = HashSet::new();
    seen.insert(&folder.id);

    let mut depth = 0;
    let mut cursor = folder;
    while let Some(parent_id) = &cursor.parent_id {
        if let Some(parent_depth) = known.get(parent_id) {
            return Ok(depth + parent_depth + 1);
        }
        let parent = by_id.get(parent_id).copied().ok_or_else(|| {
            AppError::invalid_backup(format!(
                "Snapshot folder '{}' references parent '{parent_id}' which is not in the snapshot",
                cursor.id
            ))
        })?;
        if !seen.insert(&parent.id) {
            return Err(AppError::invalid_backup(format!(
                "Snapshot folder '{}' is part of a parent cycle",
                folder.id
            )));
        }
        depth += 1;
        cursor = parent;
    }

    Ok(depth)
}
