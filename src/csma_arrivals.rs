// Poisson packet arrivals, pregenerated per node

use std::collections::VecDeque;

use rand::Rng;

use crate::csma_error::{CsmaError, CsmaResult};
use crate::csma_interface::SimTime;

/// Draw one exponential inter-arrival time by inverse-CDF sampling.
///
/// `u` is uniform on [0, 1), so `1 - u` is never zero and the log is finite.
pub fn exponential_sample<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> SimTime {
    let uniform: f64 = rng.gen();
    -(1.0 / rate) * (1.0 - uniform).ln()
}

/// Generate every arrival of one node up to `horizon`.
///
/// Inter-arrival times are accumulated while the running total is still within
/// the horizon, so the returned queue always ends with exactly one timestamp
/// past `horizon`. The engine never sends it: the run stops as soon as the
/// earliest pending head lies beyond the horizon.
pub fn pregen_arrivals<R: Rng + ?Sized>(
    rate: f64,
    horizon: SimTime,
    rng: &mut R,
) -> CsmaResult<VecDeque<SimTime>> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(CsmaError::InvalidArrivalRate(rate));
    }
    if !horizon.is_finite() || horizon < 0.0 {
        return Err(CsmaError::InvalidHorizon(horizon));
    }

    // rough size hint: mean count is rate * horizon
    let mut arrivals = VecDeque::with_capacity((rate * horizon) as usize + 1);
    let mut total: SimTime = 0.0;

    while total <= horizon {
        total += exponential_sample(rate, rng);
        arrivals.push_back(total);
    }

    Ok(arrivals)
}
