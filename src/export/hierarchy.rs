//! Materializing DAG ancestor chains in the archive.

use crate::archive::{ArchiveWriter, ObjectId};
use crate::util::{strip_namespaces, DagPath, Error, Result};

/// Walk `path` below `root`, creating missing ancestors with `create`.
///
/// Every component except the last is looked up by its namespace-stripped
/// name; absent ones are handed to `create` together with the unstripped
/// path prefix ending at that component. Returns the object the leaf should
/// be parented under. Objects created before a failure are kept.
pub fn ensure_path<A, F>(
    archive: &mut A,
    root: ObjectId,
    path: &DagPath,
    strip_depth: u32,
    mut create: F,
) -> Result<ObjectId>
where
    A: ArchiveWriter + ?Sized,
    F: FnMut(&mut A, ObjectId, &DagPath) -> Result<ObjectId>,
{
    let mut current = root;
    let ancestors = path.len().saturating_sub(1);

    for (i, component) in path.components()[..ancestors].iter().enumerate() {
        let step = strip_namespaces(component, strip_depth);
        if !archive.is_valid(current) {
            return Err(Error::HierarchyCreation {
                component: component.clone(),
            });
        }

        current = match archive.child_by_name(current, step) {
            Some(child) => child,
            None => {
                let prefix = path.prefix(i + 1);
                let created = create(archive, current, &prefix).map_err(|e| {
                    tracing::debug!("creating {} failed: {}", prefix, e);
                    Error::HierarchyCreation {
                        component: component.clone(),
                    }
                })?;
                if !archive.is_valid(created) {
                    return Err(Error::HierarchyCreation {
                        component: component.clone(),
                    });
                }
                created
            }
        };
    }
    Ok(current)
}
