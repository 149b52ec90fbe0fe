//! Light sources and their GPU packing.
//!
//! A [`Light`] carries the fields common to every kind (color, specular color,
//! intensity, attenuation, position) plus a [`LightKind`] holding the kind-specific
//! parameters. [`GpuLight`] is the 80-byte layout the fragment shader reads; the
//! CPU-side falloff functions here mirror `shaders/lit.wgsl` exactly.

use glam::Vec3;

/// Which lighting model a [`Light`] uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Infinitely distant light. Position and attenuation are ignored.
    Sun {
        /// Direction the light travels in.
        direction: Vec3,
    },
    /// Flat color added to every surface.
    Ambient,
    /// Omnidirectional light at `position`, attenuated by distance.
    Point,
    /// Cone of light at `position`, attenuated by distance and by angle from the cone axis.
    Spot {
        /// Half-angle of the cone in radians.
        cone_angle: f32,
        /// Axis of the cone.
        cone_direction: Vec3,
        /// Exponent applied to the cosine falloff inside the cone.
        cone_attenuation: f32,
    },
}

impl LightKind {
    /// Discriminant written into [`GpuLight::kind`].
    pub const fn tag(&self) -> u32 {
        match self {
            LightKind::Sun { .. } => 1,
            LightKind::Spot { .. } => 2,
            LightKind::Point => 3,
            LightKind::Ambient => 4,
        }
    }
}

/// A single light source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// World-space position. Unused by `Sun` and `Ambient`.
    pub position: Vec3,
    pub color: Vec3,
    pub specular_color: Vec3,
    pub intensity: f32,
    /// Constant, linear and quadratic attenuation coefficients.
    pub attenuation: Vec3,
}

impl Light {
    fn with_kind(kind: LightKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            color: Vec3::ONE,
            specular_color: Vec3::splat(0.6),
            intensity: 1.0,
            attenuation: Vec3::X,
        }
    }

    /// A white sun shining along `direction`.
    pub fn sun(direction: impl Into<Vec3>) -> Self {
        Self::with_kind(LightKind::Sun {
            direction: direction.into().normalize_or(Vec3::NEG_Y),
        })
    }

    /// A flat ambient term.
    pub fn ambient(color: impl Into<Vec3>, intensity: f32) -> Self {
        Self::with_kind(LightKind::Ambient)
            .color(color)
            .intensity(intensity)
    }

    /// A white point light with no distance falloff.
    pub fn point(position: impl Into<Vec3>) -> Self {
        Self::with_kind(LightKind::Point).position(position)
    }

    /// A white spotlight.
    pub fn spot(
        position: impl Into<Vec3>,
        cone_direction: impl Into<Vec3>,
        cone_angle: f32,
        cone_attenuation: f32,
    ) -> Self {
        Self::with_kind(LightKind::Spot {
            cone_angle,
            cone_direction: cone_direction.into().normalize_or(Vec3::NEG_Y),
            cone_attenuation,
        })
        .position(position)
    }

    pub fn position(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn color(mut self, color: impl Into<Vec3>) -> Self {
        self.color = color.into();
        self
    }

    pub fn specular_color(mut self, color: impl Into<Vec3>) -> Self {
        self.specular_color = color.into();
        self
    }

    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the constant, linear and quadratic attenuation coefficients.
    pub fn attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.attenuation = Vec3::new(constant, linear, quadratic);
        self
    }

    /// Distance falloff `1 / (c0 + c1*d + c2*d^2)` at distance `d`.
    ///
    /// Always 1 for `Sun` and `Ambient`.
    pub fn distance_attenuation(&self, d: f32) -> f32 {
        match self.kind {
            LightKind::Sun { .. } | LightKind::Ambient => 1.0,
            LightKind::Point | LightKind::Spot { .. } => {
                let c = self.attenuation;
                1.0 / (c.x + c.y * d + c.z * d * d).max(f32::EPSILON)
            }
        }
    }

    /// Angular falloff of a spotlight for a surface at `surface`.
    ///
    /// Zero outside the cone, `max(cos(theta), 0)^cone_attenuation` inside it. Cones
    /// wider than a hemisphere give zero behind the light. Always 1 for the other kinds.
    pub fn cone_falloff(&self, surface: Vec3) -> f32 {
        let LightKind::Spot {
            cone_angle,
            cone_direction,
            cone_attenuation,
        } = self.kind
        else {
            return 1.0;
        };
        let to_surface = (surface - self.position).normalize_or_zero();
        let cos_theta = to_surface.dot(cone_direction.normalize_or_zero());
        if cos_theta > cone_angle.cos() {
            cos_theta.max(0.0).powf(cone_attenuation)
        } else {
            0.0
        }
    }

    /// Combined scalar falloff (distance times cone) this light applies at `surface`.
    pub fn intensity_at(&self, surface: Vec3) -> f32 {
        let d = surface.distance(self.position);
        self.intensity * self.distance_attenuation(d) * self.cone_falloff(surface)
    }

    /// Pack into the shader-side layout.
    pub fn to_gpu(&self) -> GpuLight {
        let (direction, cone_angle, cone_attenuation) = match self.kind {
            LightKind::Sun { direction } => (direction, 0.0, 0.0),
            LightKind::Spot {
                cone_angle,
                cone_direction,
                cone_attenuation,
            } => (cone_direction, cone_angle, cone_attenuation),
            LightKind::Ambient | LightKind::Point => (Vec3::ZERO, 0.0, 0.0),
        };
        GpuLight {
            position: self.position.to_array(),
            kind: self.kind.tag(),
            color: self.color.to_array(),
            intensity: self.intensity,
            specular_color: self.specular_color.to_array(),
            cone_angle,
            attenuation: self.attenuation.to_array(),
            cone_attenuation,
            direction: direction.to_array(),
            _pad: 0.0,
        }
    }
}

/// Shader-side light record. Matches `struct Light` in `shaders/lit.wgsl`.
///
/// `direction` is the sun direction for `Sun` and the cone axis for `Spot`.
/// A zeroed record (kind 0) is an unused slot.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub kind: u32,
    pub color: [f32; 3],
    pub intensity: f32,
    pub specular_color: [f32; 3],
    pub cone_angle: f32,
    pub attenuation: [f32; 3],
    pub cone_attenuation: f32,
    pub direction: [f32; 3],
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layout_is_uniform_friendly() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 80);
        assert_eq!(std::mem::size_of::<GpuLight>() % 16, 0);
    }

    #[test]
    fn point_attenuation_follows_quadratic() {
        let light = Light::point([0.0, 0.0, 0.0]).attenuation(1.0, 3.0, 4.0);
        assert_eq!(light.distance_attenuation(0.0), 1.0);
        // 1 / (1 + 3*0.5 + 4*0.25)
        assert!((light.distance_attenuation(0.5) - 1.0 / 3.5).abs() < 1e-6);
        assert!(light.intensity_at(Vec3::new(0.0, 2.0, 0.0)) < light.intensity_at(Vec3::Y));
    }

    #[test]
    fn sun_and_ambient_ignore_distance() {
        let sun = Light::sun([0.0, -1.0, 0.0]).attenuation(1.0, 10.0, 10.0);
        let ambient = Light::ambient([0.5, 1.0, 0.0], 0.15);
        let far = Vec3::new(100.0, -40.0, 7.0);
        assert_eq!(sun.intensity_at(far), 1.0);
        assert!((ambient.intensity_at(far) - 0.15).abs() < 1e-7);
    }

    #[test]
    fn spot_is_dark_outside_cone() {
        let spot = Light::spot([0.0, 2.0, 0.0], [0.0, -1.0, 0.0], 20f32.to_radians(), 12.0);

        // Straight down the axis: cos = 1
        assert_eq!(spot.cone_falloff(Vec3::ZERO), 1.0);

        // 45 degrees off-axis, outside a 20 degree cone
        assert_eq!(spot.cone_falloff(Vec3::new(2.0, 0.0, 0.0)), 0.0);

        // 10 degrees off-axis: inside, attenuated by cos^12
        let off = Vec3::new(2.0 * 10f32.to_radians().tan(), 0.0, 0.0);
        let expected = 10f32.to_radians().cos().powf(12.0);
        assert!((spot.cone_falloff(off) - expected).abs() < 1e-5);
    }

    #[test]
    fn wide_cone_stays_finite_behind_the_light() {
        let spot = Light::spot(Vec3::ZERO, [0.0, -1.0, 0.0], 120f32.to_radians(), 2.5);

        // Above the light, inside the 120 degree half-angle but facing away from the axis.
        let behind = spot.cone_falloff(Vec3::new(1.0, 0.5, 0.0));
        assert!(behind.is_finite());
        assert_eq!(behind, 0.0);

        assert_eq!(spot.cone_falloff(Vec3::NEG_Y), 1.0);
        assert!(spot.intensity_at(Vec3::new(1.0, 0.5, 0.0)).is_finite());
    }

    #[test]
    fn packing_routes_kind_specific_fields() {
        let spot = Light::spot([0.4, 0.8, 1.0], [-2.0, 0.0, -1.5], 0.7, 12.0)
            .color([1.0, 0.0, 1.0])
            .attenuation(1.0, 0.5, 0.0);
        let gpu = spot.to_gpu();
        assert_eq!(gpu.kind, 2);
        assert_eq!(gpu.cone_angle, 0.7);
        assert_eq!(gpu.cone_attenuation, 12.0);
        assert!(Vec3::from(gpu.direction).abs_diff_eq(Vec3::new(-0.8, 0.0, -0.6), 1e-6));
        assert_eq!(gpu.attenuation, [1.0, 0.5, 0.0]);

        let sun = Light::sun([0.0, 0.0, -3.0]).to_gpu();
        assert_eq!(sun.kind, 1);
        assert_eq!(sun.direction, [0.0, 0.0, -1.0]);

        assert_eq!(Light::point(Vec3::ONE).to_gpu().kind, 3);
        assert_eq!(Light::ambient(Vec3::ONE, 1.0).to_gpu().kind, 4);
    }
}
