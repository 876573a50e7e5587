use crate::error::{ErrorCode, Result, StashError};
use crate::model::Record;
use crate::store::Table;

/// Trims `raw` and rejects it if nothing is left.
pub fn require_name(raw: &str, what: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(StashError::invalid(format!("{} name cannot be blank", what)));
    }
    Ok(name.to_string())
}

/// Rejects an empty id/name list.
pub fn require_some<T>(list: &[T], what: &str) -> Result<()> {
    if list.is_empty() {
        return Err(StashError::invalid(format!("No {} specified", what)));
    }
    Ok(())
}

/// Fails with `code` if any id in `ids` is missing from `table`.
pub fn require_all<T: Record>(table: &Table<T>, ids: &[String], code: ErrorCode) -> Result<()> {
    let missing: Vec<String> = table.missing(ids).into_iter().cloned().collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(StashError::invalid_reference(
        code,
        format!("Unknown {} id{}: {}", T::ENTITY.to_lowercase(), plural(missing.len()), missing.join(", ")),
        missing,
    ))
}

/// Appends the entries of `extra` not already in `list`, keeping order.
pub fn union_into(list: &mut Vec<String>, extra: &[String]) -> usize {
    let mut added = 0;
    for id in extra {
        if !list.contains(id) {
            list.push(id.clone());
            added += 1;
        }
    }
    added
}

/// Removes every entry of `gone` from `list`.
pub fn subtract(list: &mut Vec<String>, gone: &[String]) -> usize {
    let before = list.len();
    list.retain(|id| !gone.contains(id));
    before - list.len()
}

pub fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::DataStore;

    #[test]
    fn require_name_trims() {
        assert_eq!(require_name("  Photos ", "Folder").unwrap(), "Photos");
        assert_eq!(require_name(" ", "Folder").unwrap_err().status(), 400);
    }

    #[test]
    fn require_all_lists_missing_ids() {
        let store = StoreFixture::new().with_user("u1", "Ann", "a@x.io").store;
        let ids = vec!["u1".to_string(), "u9".to_string()];
        match require_all(store.users(), &ids, ErrorCode::InvalidUserIds) {
            Err(StashError::InvalidReference { code, ids, .. }) => {
                assert_eq!(code, ErrorCode::InvalidUserIds);
                assert_eq!(ids, vec!["u9"]);
            }
            other => panic!("expected InvalidReference, got {:?}", other),
        }
    }

    #[test]
    fn union_and_subtract_report_changes() {
        let mut list = vec!["a".to_string(), "b".to_string()];
        assert_eq!(union_into(&mut list, &["b".into(), "c".into(), "c".into()]), 1);
        assert_eq!(list, vec!["a", "b", "c"]);
        assert_eq!(subtract(&mut list, &["a".into(), "z".into()]), 1);
        assert_eq!(list, vec!["b", "c"]);
    }
}
