//! One-unit quantity constants so call sites read as `475.0 * uc::KW` instead of
//! `si::Power::new::<kilowatt>(475.0)`. Grounded on `altrios_core::uc`.

use crate::si;

pub const KW: si::Power = si::Power {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0e3,
};
pub const W: si::Power = si::Power {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0,
};
pub const KG: si::Mass = si::Mass {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0,
};
pub const S: si::Time = si::Time {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0,
};
pub const R: si::Ratio = si::Ratio {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0,
};
pub const MJ: si::Energy = si::Energy {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0e6,
};
pub const KG_PER_S: si::MassRate = si::MassRate {
    dimension: std::marker::PhantomData,
    units: std::marker::PhantomData,
    value: 1.0,
};
