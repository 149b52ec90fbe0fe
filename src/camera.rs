use glam::{Mat4, Vec2, Vec3};

/// Smallest orbit distance the view matrix will use.
pub const MIN_DISTANCE: f32 = 1e-3;

/// Pitch is kept this far away from straight up/down so the fixed up vector
/// never becomes parallel to the view direction.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Unit vector from the orbit target towards the eye.
///
/// Yaw rotates around +Y starting from +Z. A negative pitch lifts the eye above the
/// target so the camera looks down onto it.
pub fn orbit_direction(pitch: f32, yaw: f32) -> Vec3 {
    Vec3::new(
        pitch.cos() * yaw.sin(),
        -pitch.sin(),
        pitch.cos() * yaw.cos(),
    )
}

/// An orbit ("arcball") camera looking at a target point from a distance.
///
/// # Example
/// ```
/// use lantern::{ArcballCamera, Vec3};
///
/// let mut camera = ArcballCamera::new()
///     .target(Vec3::new(0.0, 1.2, 0.0))
///     .distance(4.3)
///     .pitch((-10.0f32).to_radians());
///
/// // Forward every surface resize
/// camera.set_aspect(1280, 720);
/// let view_proj = camera.projection_matrix() * camera.view_matrix();
/// ```
#[derive(Clone, Debug)]
pub struct ArcballCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target. Values <= 0 are clamped to [`MIN_DISTANCE`].
    pub distance: f32,
    /// `x` = pitch, `y` = yaw, in radians. Pitch is clamped short of the poles when used.
    pub rotation: Vec2,
    /// Field of view in radians.
    pub fov: f32,
    /// Viewport width / height. Never zero.
    aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ArcballCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            rotation: Vec2::ZERO,
            fov: 70f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl ArcballCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target point to orbit around.
    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the distance from target.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    /// Set the pitch (vertical angle) in radians.
    pub fn pitch(mut self, pitch: f32) -> Self {
        self.rotation.x = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self
    }

    /// Set the yaw (horizontal angle) in radians.
    pub fn yaw(mut self, yaw: f32) -> Self {
        self.rotation.y = yaw;
        self
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Set the near and far clip planes.
    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Update the aspect ratio from the presentation surface size.
    ///
    /// Surfaces report a zero dimension while minimized or mid-resize; those
    /// updates are ignored and the previous aspect is kept.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::trace!("ignoring degenerate aspect {width}x{height}");
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Rotate around the target by the given angle deltas (radians).
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.rotation.y += d_yaw;
        self.rotation.x = (self.rotation.x + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move towards (negative) or away from (positive) the target.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance + delta).max(MIN_DISTANCE);
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        let distance = self.distance.max(MIN_DISTANCE);
        let pitch = self.rotation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.target + distance * orbit_direction(pitch, self.rotation.y)
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// View-to-clip transform (right-handed, depth 0..1).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn aspect_term_matches_surface_ratio() {
        let mut camera = ArcballCamera::new();
        for (w, h) in [(1, 1), (1920, 1080), (600, 800), (3, 7000), (4096, 1)] {
            camera.set_aspect(w, h);
            let proj = camera.projection_matrix();
            // y scale / x scale of a perspective matrix is the aspect
            let aspect = proj.y_axis.y / proj.x_axis.x;
            let expected = w as f32 / h as f32;
            assert!((aspect - expected).abs() <= expected * 1e-5, "{w}x{h}: {aspect}");
        }
    }

    #[test]
    fn zero_height_keeps_previous_aspect() {
        let mut camera = ArcballCamera::new();
        camera.set_aspect(800, 400);
        camera.set_aspect(800, 0);
        camera.set_aspect(0, 600);
        assert_eq!(camera.aspect(), 2.0);
        assert!(camera.projection_matrix().is_finite());
    }

    #[test]
    fn eye_sits_on_orbit_direction() {
        let camera = ArcballCamera::new()
            .target([0.0, 1.2, 0.0])
            .distance(4.3)
            .pitch((-10.0f32).to_radians());

        let expected =
            Vec3::new(0.0, 1.2, 0.0) + 4.3 * orbit_direction((-10.0f32).to_radians(), 0.0);
        assert!(camera.position().abs_diff_eq(expected, 1e-6));
        // Negative pitch looks down onto the target
        assert!(camera.position().y > 1.2);

        // The eye maps to the view-space origin, the target onto -Z
        let view = camera.view_matrix();
        let eye = view * camera.position().extend(1.0);
        assert!(eye.abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-5));
        let target = view * Vec3::new(0.0, 1.2, 0.0).extend(1.0);
        assert!(target.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, -4.3), 1e-5));
    }

    #[test]
    fn non_positive_distance_is_clamped() {
        let camera = ArcballCamera::new().target([1.0, 2.0, 3.0]).distance(0.0);
        let offset = camera.position() - Vec3::new(1.0, 2.0, 3.0);
        assert!((offset.length() - MIN_DISTANCE).abs() < 1e-6);
        assert!(camera.view_matrix().is_finite());

        let behind = ArcballCamera::new().distance(-2.0);
        assert!(behind.view_matrix().is_finite());
    }

    #[test]
    fn orbit_clamps_pitch() {
        let mut camera = ArcballCamera::new();
        camera.orbit(0.5, 10.0);
        assert!(camera.rotation.x < std::f32::consts::FRAC_PI_2);
        assert_eq!(camera.rotation.y, 0.5);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn pole_pitch_written_directly_is_clamped() {
        for pitch in [std::f32::consts::FRAC_PI_2, -std::f32::consts::FRAC_PI_2, 7.0] {
            let mut camera = ArcballCamera::new().target([0.0, 1.0, 0.0]);
            camera.rotation.x = pitch;

            let view = camera.view_matrix();
            assert!(view.is_finite(), "pitch {pitch}");
            let target = view * Vec4::new(0.0, 1.0, 0.0, 1.0);
            assert!(target.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-3));
        }
    }

    #[test]
    fn zoom_never_crosses_target() {
        let mut camera = ArcballCamera::new().distance(1.0);
        camera.zoom(-5.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
    }
}
