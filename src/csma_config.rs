//! Channel and timing configuration
//!
//! Defaults describe a 1 Mbps bus carrying 1500-bit frames, with stations
//! spaced 10 m apart and signals travelling at two thirds of the speed of
//! light, simulated for 10 seconds.

use serde::Deserialize;

use crate::csma_error::{CsmaError, CsmaResult};
use crate::csma_interface::{NodeIndex, SimTime, BACKOFF_SLOT_BITS, MAX_RETRIES};

// 2^attempt has to fit the backoff draw
const RETRY_LIMIT_CEILING: u32 = 32;

/// Physical and protocol constants of the simulated bus
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Simulated time T (seconds)
    pub horizon: SimTime,

    /// Frame length L (bits)
    pub frame_bits: f64,

    /// Channel bit rate R (bits/s)
    pub bit_rate: f64,

    /// Distance between neighbouring stations (m)
    pub node_spacing: f64,

    /// Signal propagation speed (m/s)
    pub signal_speed: f64,

    /// Collisions a head packet may suffer before it is dropped
    pub max_retries: u32,

    /// Backoff slot length in bit-times
    pub backoff_slot_bits: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            horizon: 10.0,
            frame_bits: 1500.0,
            bit_rate: 1e6,
            node_spacing: 10.0,
            signal_speed: (2.0 / 3.0) * 3e8,
            max_retries: MAX_RETRIES,
            backoff_slot_bits: BACKOFF_SLOT_BITS,
        }
    }
}

impl ChannelConfig {
    /// Time to put one full frame on the medium (L/R)
    pub fn transmission_time(&self) -> SimTime {
        self.frame_bits / self.bit_rate
    }

    /// Propagation delay between two neighbouring stations (d/s)
    pub fn unit_propagation(&self) -> SimTime {
        self.node_spacing / self.signal_speed
    }

    /// Propagation delay between two stations on the linear bus
    pub fn propagation(&self, a: NodeIndex, b: NodeIndex) -> SimTime {
        a.abs_diff(b) as f64 * self.unit_propagation()
    }

    /// Length of one backoff slot in seconds
    pub fn slot_time(&self) -> SimTime {
        self.backoff_slot_bits as f64 / self.bit_rate
    }

    /// Delivered data rate in Mbps for `succeeded` frames over the horizon
    pub fn throughput_mbps(&self, succeeded: u64) -> f64 {
        if self.horizon <= 0.0 {
            return 0.0;
        }
        (succeeded as f64 * self.frame_bits / self.horizon) / 1e6
    }

    /// Check that every constant is usable by the engine
    pub fn validate(&self) -> CsmaResult<()> {
        if !self.horizon.is_finite() || self.horizon < 0.0 {
            return Err(CsmaError::InvalidHorizon(self.horizon));
        }

        let positive = [
            ("frame_bits", self.frame_bits),
            ("bit_rate", self.bit_rate),
            ("node_spacing", self.node_spacing),
            ("signal_speed", self.signal_speed),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CsmaError::InvalidChannel(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.backoff_slot_bits == 0 {
            return Err(CsmaError::InvalidChannel(
                "backoff_slot_bits must be positive".to_string(),
            ));
        }
        if self.max_retries >= RETRY_LIMIT_CEILING {
            return Err(CsmaError::InvalidChannel(format!(
                "max_retries must be below {}, got {}",
                RETRY_LIMIT_CEILING, self.max_retries
            )));
        }

        Ok(())
    }
}
