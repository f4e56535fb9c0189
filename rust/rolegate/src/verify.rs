use crate::{ConsistencyError, Directory, Identifier, Index, RegistryState, Right};
use rolegate_relation::{CompositeKey, Relation};
use std::sync::Arc;

/// Checks every structural invariant of a registry snapshot.
///
/// - Each directory is a bijection: its two indices have the same size and
///   every id→name entry maps back name→id.
/// - Each relation is mirrored: equal index sizes, every forward row
///   `(a, b)` has a backward row `(b, a)` sharing the same payload, and the
///   other way around.
/// - Every relation coordinate names a live entity of the right kind.
/// - Every authorization payload names the role and service of its row.
///
/// Returns the first violation found.
pub fn verify(state: &RegistryState) -> Result<(), ConsistencyError> {
    verify_directory("users", &state.users)?;
    verify_directory("roles", &state.roles)?;
    verify_directory("services", &state.services)?;

    verify_relation(
        "membership",
        &state.membership,
        |user| state.users.exists(user.into()),
        |role| state.roles.exists(role.into()),
        |_, _| None,
    )?;

    verify_relation(
        "authorization",
        &state.authorization,
        |role| state.roles.exists(role.into()),
        |service| state.services.exists(service.into()),
        |key, right: &Right| {
            (right.role.0 != key.high() || right.service.0 != key.low()).then(|| {
                format!(
                    "payload names {} and {} instead",
                    right.role, right.service
                )
            })
        },
    )?;

    Ok(())
}

fn violation(
    table: &'static str,
    index: Index,
    row: impl ToString,
    message: impl Into<String>,
) -> ConsistencyError {
    ConsistencyError {
        table,
        index,
        row: row.to_string(),
        message: message.into(),
    }
}

fn verify_directory<I, V>(
    table: &'static str,
    directory: &Directory<I, V>,
) -> Result<(), ConsistencyError>
where
    I: Identifier,
{
    if directory.len() != directory.name_count() {
        return Err(violation(
            table,
            Index::ById,
            "*",
            format!(
                "{} identifiers but {} names",
                directory.len(),
                directory.name_count()
            ),
        ));
    }

    for (id, name) in directory.id_rows() {
        if directory.id_of(name).map(Into::<u32>::into) != Some(id) {
            return Err(violation(
                table,
                Index::ById,
                id,
                format!("name '{name}' does not map back"),
            ));
        }
    }

    for (name, id) in directory.name_rows() {
        if directory.name_of(I::from(id)) != Some(name) {
            return Err(violation(
                table,
                Index::ByName,
                name,
                format!("identifier {id} does not map back"),
            ));
        }
    }

    Ok(())
}

fn verify_relation<P, L, R, C>(
    table: &'static str,
    relation: &Relation<P>,
    left_exists: L,
    right_exists: R,
    check_payload: C,
) -> Result<(), ConsistencyError>
where
    L: Fn(u32) -> bool,
    R: Fn(u32) -> bool,
    C: Fn(CompositeKey, &P) -> Option<String>,
{
    if relation.len() != relation.backward_len() {
        return Err(violation(
            table,
            Index::Forward,
            "*",
            format!(
                "{} forward rows but {} backward rows",
                relation.len(),
                relation.backward_len()
            ),
        ));
    }

    for (key, payload) in relation.forward_rows() {
        match relation.backward_get(key.swapped()) {
            None => {
                return Err(violation(table, Index::Forward, key, "no backward mirror"));
            }
            Some(mirror) if !Arc::ptr_eq(mirror, payload) => {
                return Err(violation(
                    table,
                    Index::Forward,
                    key,
                    "backward mirror carries a different payload",
                ));
            }
            Some(_) => {}
        }

        let (left, right) = key.unpack();
        if !left_exists(left) {
            return Err(violation(table, Index::Forward, key, format!("{left} does not exist")));
        }
        if !right_exists(right) {
            return Err(violation(table, Index::Forward, key, format!("{right} does not exist")));
        }
        if let Some(message) = check_payload(key, payload) {
            return Err(violation(table, Index::Forward, key, message));
        }
    }

    for (key, _) in relation.backward_rows() {
        if relation.forward_get(key.swapped()).is_none() {
            return Err(violation(table, Index::Backward, key, "no forward mirror"));
        }
    }

    Ok(())
}
