//! Emission and transition log-densities (Newson & Krumm 2009).

use std::f64::consts::PI;

/// HMM probability parameters.
///
/// `sigma` models GPS measurement noise: emissions are Gaussian in the
/// projection error.  `beta` models route plausibility: transitions decay
/// exponentially in the difference between the routed distance and the
/// straight-line distance of the two observations.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HmmProbabilities {
    /// Measurement noise standard deviation in meters.
    pub sigma: f64,
    /// Transition deviation scale in meters.
    pub beta: f64,
}

impl Default for HmmProbabilities {
    fn default() -> Self {
        Self {
            sigma: 50.0,
            beta: 2.0,
        }
    }
}

impl HmmProbabilities {
    pub fn new(sigma: f64, beta: f64) -> Self {
        Self { sigma, beta }
    }

    /// Log emission density for a candidate `dist_m` meters from the raw
    /// observation: `log N(dist_m; 0, sigma)`.
    pub fn emission_log_p(&self, dist_m: f64) -> f64 {
        (1.0 / ((2.0 * PI).sqrt() * self.sigma)).ln() - 0.5 * (dist_m / self.sigma).powi(2)
    }

    /// Log transition density for a route of `route_len_m` meters between
    /// observations `linear_len_m` meters apart:
    /// `log Exp(|linear - route|; 1/beta)`.
    pub fn transition_log_p(&self, route_len_m: f64, linear_len_m: f64) -> f64 {
        (1.0 / self.beta).ln() - (linear_len_m - route_len_m).abs() / self.beta
    }
}
