//! Unit-safe wrappers for the capacity and demand quantities the pipeline
//! handles.
//!
//! Generator rosters report nameplate capacity in MW while the published
//! dataset reports system peak in GW; keeping both as newtypes makes the
//! MW → GW step explicit.
//!
//! ```
//! use esr_core::units::{Gigawatts, Megawatts};
//!
//! let peak = Megawatts(85_508.0);
//! assert_eq!(peak.to_gigawatts().round_to(1), Gigawatts(85.5));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// Round to a fixed number of decimal places
            pub fn round_to(self, decimals: u32) -> Self {
                Self(round_to(self.0, decimals))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Capacity or demand in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

impl Megawatts {
    pub fn to_gigawatts(self) -> Gigawatts {
        Gigawatts(self.0 / 1000.0)
    }
}

/// System peak demand in gigawatts (GW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Gigawatts(pub f64);

impl_unit_ops!(Gigawatts, "GW");

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_megawatts() {
        let total: Megawatts = [Megawatts(50.0), Megawatts(30.0)].iter().sum();
        assert_eq!(total, Megawatts(80.0));
    }

    #[test]
    fn test_gigawatt_conversion() {
        let gw = Megawatts(1500.0).to_gigawatts();
        assert_eq!(gw, Gigawatts(1.5));
        assert_eq!(Megawatts(152_634.0).to_gigawatts().round_to(1).value(), 152.6);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(44.75, 1), 44.8);
        assert_eq!(round_to(27.556, 2), 27.56);
        assert_eq!(round_to(44.8, 0), 45.0);
    }
}
