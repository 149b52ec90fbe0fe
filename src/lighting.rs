use crate::error::LightingError;
use crate::light::{GpuLight, Light};

/// Length of the light array in the fragment shader.
pub const MAX_LIGHTS: usize = 8;

/// Lights packed for upload: a full shader-sized array plus how many slots are live.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackedLights {
    pub lights: [GpuLight; MAX_LIGHTS],
    pub count: u32,
}

impl PackedLights {
    /// The live prefix of the array.
    pub fn active(&self) -> &[GpuLight] {
        &self.lights[..self.count as usize]
    }
}

/// Ordered, bounded set of scene lights.
///
/// Insertion past [`MAX_LIGHTS`] is rejected rather than truncated, so the count the
/// shader sees always equals the number of registered lights.
#[derive(Clone, Debug, Default)]
pub struct Lighting {
    lights: Vec<Light>,
}

impl Lighting {
    pub fn new() -> Self {
        Self {
            lights: Vec::with_capacity(MAX_LIGHTS),
        }
    }

    /// Register a light, returning its index.
    pub fn add(&mut self, light: Light) -> Result<usize, LightingError> {
        if self.lights.len() >= MAX_LIGHTS {
            return Err(LightingError::CapacityExceeded {
                capacity: MAX_LIGHTS,
            });
        }
        self.lights.push(light);
        Ok(self.lights.len() - 1)
    }

    /// Remove the light at `index`. Later lights shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<Light> {
        (index < self.lights.len()).then(|| self.lights.remove(index))
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    /// Pack the current lights for the shader. Unused slots are zeroed.
    pub fn lights(&self) -> PackedLights {
        let mut lights = [GpuLight::default(); MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&self.lights) {
            *slot = light.to_gpu();
        }
        PackedLights {
            lights,
            count: self.lights.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn count_tracks_registration() {
        let mut lighting = Lighting::new();
        assert_eq!(lighting.lights().count, 0);

        for i in 0..MAX_LIGHTS {
            let before = lighting.lights().count;
            let index = lighting.add(Light::point([i as f32, 0.0, 0.0])).unwrap();
            assert_eq!(index, i);
            assert_eq!(lighting.lights().count, before + 1);
        }

        lighting.remove(0);
        assert_eq!(lighting.lights().count as usize, MAX_LIGHTS - 1);
        assert_eq!(lighting.len(), MAX_LIGHTS - 1);
    }

    #[test]
    fn over_capacity_is_rejected() {
        let mut lighting = Lighting::new();
        for _ in 0..MAX_LIGHTS {
            lighting.add(Light::ambient(Vec3::ONE, 0.1)).unwrap();
        }
        let before = lighting.lights();

        let err = lighting.add(Light::point(Vec3::ZERO)).unwrap_err();
        assert_eq!(
            err,
            LightingError::CapacityExceeded {
                capacity: MAX_LIGHTS
            }
        );
        assert_eq!(lighting.lights(), before);
    }

    #[test]
    fn edits_in_place_show_up_in_next_pack() {
        let mut lighting = Lighting::new();
        lighting.add(Light::point([0.0, 0.5, -0.5])).unwrap();

        if let Some(light) = lighting.get_mut(0) {
            light.position = Vec3::new(2.0, 1.0, 0.0);
            light.intensity = 0.5;
        }
        let packed = lighting.lights();
        assert_eq!(packed.count, 1);
        assert_eq!(packed.lights[0].position, [2.0, 1.0, 0.0]);
        assert_eq!(packed.lights[0].intensity, 0.5);
        assert!(lighting.get_mut(1).is_none());
    }

    #[test]
    fn packing_preserves_order_and_zeroes_tail() {
        let mut lighting = Lighting::new();
        lighting.add(Light::sun([0.0, -1.0, 0.0])).unwrap();
        lighting.add(Light::point([1.0, 2.0, 3.0])).unwrap();

        let packed = lighting.lights();
        assert_eq!(packed.active().len(), 2);
        assert_eq!(packed.lights[0].kind, 1);
        assert_eq!(packed.lights[1].position, [1.0, 2.0, 3.0]);
        assert!(packed.lights[2..].iter().all(|l| *l == GpuLight::default()));
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut lighting = Lighting::new();
        assert!(lighting.remove(3).is_none());
        assert!(lighting.is_empty());
    }
}
