use uuid::Uuid;

use crate::features::categories::models::MoveDirection;

/// Plan a one-step move of `id` within its sibling group.
///
/// `siblings` holds `(id, sort_order)` for every row sharing the parent,
/// including `id` itself. Returns the rows whose `sort_order` must change,
/// or `None` when `id` is already first / last (or not in the group).
///
/// Tied values are first spread apart in display order `(sort_order, id)`,
/// each row taking at least one more than the row before it; rows that are
/// already strictly increasing keep their value. The pair is then swapped,
/// so a move in the opposite direction restores both values.
pub(crate) fn plan_sibling_move(
    siblings: &[(Uuid, i32)],
    id: Uuid,
    direction: MoveDirection,
) -> Option<Vec<(Uuid, i32)>> {
    let mut ordered = siblings.to_vec();
    ordered.sort_by_key(|&(sibling_id, sort_order)| (sort_order, sibling_id));

    let position = ordered.iter().position(|&(sibling_id, _)| sibling_id == id)?;
    let neighbour = match direction {
        MoveDirection::Up => position.checked_sub(1)?,
        MoveDirection::Down => Some(position + 1).filter(|&i| i < ordered.len())?,
    };

    let original = ordered.clone();
    for i in 1..ordered.len() {
        let floor = ordered[i - 1].1.saturating_add(1);
        if ordered[i].1 < floor {
            ordered[i].1 = floor;
        }
    }

    let current_order = ordered[position].1;
    ordered[position].1 = ordered[neighbour].1;
    ordered[neighbour].1 = current_order;

    Some(
        ordered
            .into_iter()
            .zip(original)
            .filter(|(new, old)| new.1 != old.1)
            .map(|(new, _)| new)
            .collect(),
    )
}
