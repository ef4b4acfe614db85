//! Unit newtypes for planning quantities.
//!
//! Capacity (MW), energy (MWh), material mass (tonnes) and money (USD) are
//! easy to mix up when everything is an `f64`. The wrappers below keep the
//! public summaries honest; the solver internals work on raw `f64` series and
//! wrap at the boundary.
//!
//! ```
//! use matcap_core::units::{Megawatts, Tonnes};
//!
//! let built = Megawatts(250.0) + Megawatts(75.0);
//! assert_eq!(built.value(), 325.0);
//!
//! let lithium = Tonnes(12.0) * 2.0;
//! assert_eq!(lithium, Tonnes(24.0));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

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

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.2} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Clamp negative values to zero.
            #[inline]
            pub fn non_negative(self) -> Self {
                Self(self.0.max(0.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Nameplate capacity in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

impl Megawatts {
    /// Energy delivered by running at this level for `hours`.
    pub fn over_hours(self, hours: f64) -> MegawattHours {
        MegawattHours(self.0 * hours)
    }
}

/// Energy in megawatt-hours (MWh)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MegawattHours(pub f64);

impl_unit_ops!(MegawattHours, "MWh");

/// Material mass in metric tonnes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Tonnes(pub f64);

impl_unit_ops!(Tonnes, "t");

/// Money in US dollars
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Usd(pub f64);

impl_unit_ops!(Usd, "USD");
