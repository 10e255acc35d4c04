//! Strongly typed scalar quantities used throughout the core, re-exported from `uom`'s
//! SI system so that power, energy, mass, and time can never be mixed up at a call site.
//! Grounded on `altrios_core::si`, which plays the same role for train simulation.

pub use uom::si::f64::{
    Energy, Mass, MassRate, Power, PowerRate, Ratio, Time, ThermodynamicTemperature, Velocity,
};
pub use uom::si::angular_velocity::revolution_per_minute;
pub use uom::si::energy::{joule, kilowatt_hour, megajoule};
pub use uom::si::f64::AngularVelocity;
pub use uom::si::mass::kilogram;
pub use uom::si::mass_rate::kilogram_per_second;
pub use uom::si::power::{kilowatt, watt};
pub use uom::si::ratio::ratio;
pub use uom::si::time::second;
