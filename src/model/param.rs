//! Trainable parameter storage

use ndarray::Array1;
use rand_chacha::ChaCha8Rng;

/// A trainable tensor stored flat, with a gradient buffer of the same size.
///
/// Layers keep the logical shape alongside the flat storage and index into
/// it themselves; optimizers only ever see the flat view, which keeps their
/// update rules shape-agnostic.
///
/// # Example
///
/// ```
/// use luna16::model::Param;
///
/// let mut p = Param::zeros(&[2, 3]);
/// assert_eq!(p.len(), 6);
/// p.grad_mut().fill(1.0);
/// p.zero_grad();
/// assert_eq!(p.grad().sum(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Param {
    data: Array1<f32>,
    grad: Array1<f32>,
    shape: Vec<usize>,
}

impl Param {
    /// All-zero parameter (used for biases)
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: Array1::zeros(len),
            grad: Array1::zeros(len),
            shape: shape.to_vec(),
        }
    }

    /// All-one parameter (used for normalization scales)
    pub fn ones(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: Array1::ones(len),
            grad: Array1::zeros(len),
            shape: shape.to_vec(),
        }
    }

    /// Kaiming-normal initialization for layers followed by a rectifier:
    /// samples are drawn from N(0, 2 / fan_out).
    pub fn kaiming_normal(shape: &[usize], fan_out: usize, rng: &mut ChaCha8Rng) -> Self {
        let len: usize = shape.iter().product();
        let std = (2.0 / fan_out as f32).sqrt();
        let mut data = Array1::zeros(len);
        for v in data.iter_mut() {
            *v = standard_normal(rng) * std;
        }
        Self {
            data,
            grad: Array1::zeros(len),
            shape: shape.to_vec(),
        }
    }

    /// Flat parameter values
    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    /// Mutable flat parameter values
    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    /// Flat accumulated gradient
    pub fn grad(&self) -> &Array1<f32> {
        &self.grad
    }

    /// Mutable flat gradient (layers accumulate into this)
    pub fn grad_mut(&mut self) -> &mut Array1<f32> {
        &mut self.grad
    }

    /// Data and gradient split-borrowed, for layers that read weights while
    /// accumulating their gradient in the same pass
    pub fn parts_mut(&mut self) -> (&Array1<f32>, &mut Array1<f32>) {
        (&self.data, &mut self.grad)
    }

    /// Logical shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of scalar values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the parameter holds no values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reset the gradient buffer to zero
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }
}

/// One draw from N(0, 1) via the Box-Muller transform.
fn standard_normal(rng: &mut ChaCha8Rng) -> f32 {
    use rand::Rng;
    let u1: f32 = rng.random::<f32>().max(1e-10);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_zeros_and_ones() {
        let z = Param::zeros(&[4, 2]);
        assert_eq!(z.len(), 8);
        assert_eq!(z.shape(), &[4, 2]);
        assert_eq!(z.data().sum(), 0.0);

        let o = Param::ones(&[3]);
        assert_eq!(o.data().sum(), 3.0);
        assert_eq!(o.grad().sum(), 0.0);
    }

    #[test]
    fn test_kaiming_normal_scale() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let p = Param::kaiming_normal(&[64, 64], 64, &mut rng);
        let mean = p.data().mean().unwrap();
        let var = p.data().mapv(|v| (v - mean) * (v - mean)).mean().unwrap();
        // Expected variance 2 / 64 = 0.03125.
        assert!(mean.abs() < 0.01, "mean {mean}");
        assert!((var - 0.03125).abs() < 0.005, "var {var}");
    }

    #[test]
    fn test_kaiming_is_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let pa = Param::kaiming_normal(&[10], 10, &mut a);
        let pb = Param::kaiming_normal(&[10], 10, &mut b);
        assert_eq!(pa.data(), pb.data());
    }

    #[test]
    fn test_zero_grad() {
        let mut p = Param::ones(&[5]);
        p.grad_mut().fill(3.0);
        p.zero_grad();
        assert_eq!(p.grad().sum(), 0.0);
    }

    #[test]
    fn test_parts_mut_split_borrow() {
        let mut p = Param::ones(&[2]);
        let (data, grad) = p.parts_mut();
        grad[0] = data[0] * 2.0;
        assert_eq!(p.grad()[0], 2.0);
    }
}
