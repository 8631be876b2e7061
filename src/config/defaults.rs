pub(super) const MAX_NEIGHBOR_COUNT: usize = 64;

pub(super) fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(super) fn clamp_neighbors(value: usize) -> usize {
    value.clamp(1, MAX_NEIGHBOR_COUNT)
}

pub(super) fn default_confidence_threshold() -> f32 {
    0.85
}

pub(super) fn default_k() -> usize {
    3
}

pub(super) fn default_evaluation_k() -> usize {
    5
}

pub(super) fn default_reference_soft_limit() -> usize {
    2_000
}

pub(super) fn default_landmark_count() -> usize {
    21
}

pub(super) fn default_coords_per_landmark() -> usize {
    3
}

pub(super) fn default_target_frame_count() -> usize {
    30
}

pub(super) fn default_holdout_fraction() -> f32 {
    0.3
}
