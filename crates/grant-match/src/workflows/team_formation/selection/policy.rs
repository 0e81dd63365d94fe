use super::advisory::AdvisoryError;
use crate::workflows::team_formation::domain::Candidate;

/// Accepts exactly `desired` distinct in-range indices, preserving the judge's order.
pub(crate) fn validate_indices(
    selected: &[i64],
    desired: usize,
    available: usize,
) -> Result<Vec<usize>, AdvisoryError> {
    if selected.len() != desired {
        return Err(AdvisoryError::InvalidResponse(format!(
            "expected {desired} indices, received {}",
            selected.len()
        )));
    }

    let mut indices = Vec::with_capacity(selected.len());
    for raw in selected {
        let index = usize::try_from(*raw)
            .ok()
            .filter(|index| *index < available)
            .ok_or_else(|| {
                AdvisoryError::InvalidResponse(format!(
                    "index {raw} outside 0..{available}"
                ))
            })?;
        if indices.contains(&index) {
            return Err(AdvisoryError::InvalidResponse(format!(
                "index {index} selected twice"
            )));
        }
        indices.push(index);
    }

    Ok(indices)
}

/// Positions of the top `desired` candidates by objective; ties keep list order.
pub(crate) fn baseline_indices(candidates: &[Candidate], desired: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|left, right| {
        candidates[*right]
            .objective
            .total_cmp(&candidates[*left].objective)
    });
    order.truncate(desired);
    order
}
