use glam::{Affine3A, Quat, Vec3};

/// Local TRS transform with cached matrices and dirty tracking.
///
/// The public position/rotation/scale fields are free to mutate; matrix
/// recomputation happens lazily in [`Transform::update_local_matrix`] by
/// comparing against a shadow copy of the last-built state. Callers that
/// bypass the comparison (batch writes that restore the previous values
/// bit-for-bit, for instance) can force a rebuild with
/// [`Transform::mark_dirty`].
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    // Shadow state for the dirty check.
    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self::new();
        transform.position = position;
        transform.rotation = rotation;
        transform.scale = scale;
        transform
    }

    /// Rebuilds the local matrix if the TRS fields changed since the last
    /// build. Returns whether a rebuild happened.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// World matrix as of the last [`crate::scene::Scene::update_world_transforms`] pass.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// Written by the scene during world matrix propagation.
    pub fn set_world_matrix(&mut self, matrix: Affine3A) {
        self.world_matrix = matrix;
    }

    /// Forces the next [`Transform::update_local_matrix`] to rebuild.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
