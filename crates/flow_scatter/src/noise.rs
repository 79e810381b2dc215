//! Seeded 2D gradient noise used for organic spacing and tube offsets.
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const TABLE_SIZE: usize = 256;

const GRADIENTS: [Vec2; 8] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    Vec2::new(-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    Vec2::new(std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
    Vec2::new(-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
];

/// Perlin-style gradient noise over a seeded permutation table.
///
/// Output lies in roughly `[-1, 1]` and is zero on integer lattice points.
#[derive(Debug, Clone)]
pub struct Noise2D {
    perm: [u8; TABLE_SIZE * 2],
}

impl Noise2D {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut table: [u8; TABLE_SIZE] = std::array::from_fn(|i| i as u8);
        for i in (1..TABLE_SIZE).rev() {
            let j = (rng.next_u32() as usize) % (i + 1);
            table.swap(i, j);
        }
        let mut perm = [0u8; TABLE_SIZE * 2];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = table[i % TABLE_SIZE];
        }
        Self { perm }
    }

    #[inline]
    fn hash(&self, x: i32, y: i32) -> usize {
        let xi = (x & 255) as usize;
        let yi = (y & 255) as usize;
        self.perm[self.perm[xi] as usize + yi] as usize
    }

    #[inline]
    fn corner(&self, cx: i32, cy: i32, offset: Vec2) -> f32 {
        GRADIENTS[self.hash(cx, cy) & 7].dot(offset)
    }

    /// Noise value at `(x, y)`.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let ix = x0 as i32;
        let iy = y0 as i32;

        let n00 = self.corner(ix, iy, Vec2::new(fx, fy));
        let n10 = self.corner(ix + 1, iy, Vec2::new(fx - 1.0, fy));
        let n01 = self.corner(ix, iy + 1, Vec2::new(fx, fy - 1.0));
        let n11 = self.corner(ix + 1, iy + 1, Vec2::new(fx - 1.0, fy - 1.0));

        let u = fade(fx);
        let v = fade(fy);
        let nx0 = lerp(n00, n10, u);
        let nx1 = lerp(n01, n11, u);
        // Max magnitude of 2D gradient noise is sqrt(0.5); rescale to [-1, 1].
        (lerp(nx0, nx1, v) * std::f32::consts::SQRT_2).clamp(-1.0, 1.0)
    }

    /// Noise value remapped to `[0, 1]`.
    pub fn sample01(&self, x: f32, y: f32) -> f32 {
        (self.sample(x, y) + 1.0) * 0.5
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
