use std::f64::consts::PI;

use auto_ops::impl_op_ex;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::utils::enums::VectorKind;

/// A concrete four-momentum value `(px, py, pz, e)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// Momentum along the x-axis.
    pub px: f64,
    /// Momentum along the y-axis.
    pub py: f64,
    /// Momentum along the beam (z) axis.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl Vec4 {
    /// Create a new [`Vec4`] from its Cartesian components.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Create a new [`Vec4`] from cylindrical coordinates and a mass.
    ///
    /// Negative masses follow the convention of treating the four-vector as
    /// spacelike, `e = sqrt(max(p² - m², 0))`.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let pt = pt.abs();
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let e = if mass >= 0.0 {
            (p2 + mass * mass).sqrt()
        } else {
            (p2 - mass * mass).max(0.0).sqrt()
        };
        Self { px, py, pz, e }
    }

    /// The spatial part as a [`nalgebra::Vector3`].
    pub fn vec3(&self) -> Vector3<f64> {
        Vector3::new(self.px, self.py, self.pz)
    }

    /// The squared magnitude of the spatial part.
    pub fn p2(&self) -> f64 {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    /// The magnitude of the spatial part.
    pub fn p(&self) -> f64 {
        self.p2().sqrt()
    }

    /// The transverse momentum.
    pub fn pt(&self) -> f64 {
        (self.px * self.px + self.py * self.py).sqrt()
    }

    /// The squared invariant mass (`e² - p²`, may be negative).
    pub fn m2(&self) -> f64 {
        self.e * self.e - self.p2()
    }

    /// The invariant mass. Spacelike vectors give `-sqrt(-m²)` so that the
    /// sign survives the square root.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 >= 0.0 {
            m2.sqrt()
        } else {
            -(-m2).sqrt()
        }
    }

    /// The cosine of the polar angle (1 for a vanishing spatial part).
    pub fn costheta(&self) -> f64 {
        let p = self.p();
        if p == 0.0 {
            1.0
        } else {
            self.pz / p
        }
    }

    /// The pseudorapidity, with vectors along the beam axis clamped to
    /// ±1e11 and the null vector mapped to 0.
    pub fn eta(&self) -> f64 {
        let costheta = self.costheta();
        if costheta * costheta < 1.0 {
            -0.5 * ((1.0 - costheta) / (1.0 + costheta)).ln()
        } else if self.pz == 0.0 {
            0.0
        } else if self.pz > 0.0 {
            10e10
        } else {
            -10e10
        }
    }

    /// The azimuthal angle in (−π, π].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    /// The transverse energy `e·pt/p` (0 when the transverse part vanishes).
    pub fn et(&self) -> f64 {
        let pt2 = self.px * self.px + self.py * self.py;
        if pt2 == 0.0 {
            return 0.0;
        }
        let et = (self.e * self.e * pt2 / self.p2()).sqrt();
        if self.e < 0.0 {
            -et
        } else {
            et
        }
    }

    /// The 3D opening angle between the spatial parts of two four-momenta.
    pub fn angle(&self, other: &Vec4) -> f64 {
        self.vec3().angle(&other.vec3())
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 {
    Vec4::new(a.px + b.px, a.py + b.py, a.pz + b.pz, a.e + b.e)
});
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 {
    Vec4::new(a.px - b.px, a.py - b.py, a.pz - b.pz, a.e - b.e)
});
impl_op_ex!(-|a: &Vec4| -> Vec4 { Vec4::new(-a.px, -a.py, -a.pz, -a.e) });

impl std::iter::Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, v| acc + v)
    }
}

/// A transverse-only momentum value `(px, py)` with a transverse energy.
///
/// Typically used for missing transverse energy at a hadron collider, where
/// the component parallel to the beam pipe is not known.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Momentum along the x-axis.
    pub px: f64,
    /// Momentum along the y-axis.
    pub py: f64,
    /// Transverse energy.
    pub e: f64,
}

impl Vec2 {
    /// Create a new [`Vec2`] from its components.
    pub fn new(px: f64, py: f64, e: f64) -> Self {
        Self { px, py, e }
    }

    /// Create a new [`Vec2`] from an azimuthal angle, a transverse energy,
    /// and an optional transverse momentum. A missing momentum gives a
    /// massless vector (`pt = et`).
    pub fn from_phi_et_pt(phi: f64, et: f64, pt: Option<f64>) -> Self {
        let pt = pt.unwrap_or(et);
        Self {
            px: pt * phi.cos(),
            py: pt * phi.sin(),
            e: et,
        }
    }

    /// The transverse mass. Negative squared masses give `-sqrt(-m²)` so
    /// that the sign survives the square root.
    pub fn m(&self) -> f64 {
        let diff = self.e * self.e - self.px * self.px - self.py * self.py;
        if diff >= 0.0 {
            diff.sqrt()
        } else {
            -(-diff).sqrt()
        }
    }

    /// The transverse momentum.
    pub fn pt(&self) -> f64 {
        (self.px * self.px + self.py * self.py).sqrt()
    }

    /// The transverse energy.
    pub fn et(&self) -> f64 {
        self.e
    }

    /// The azimuthal angle in (−π, π].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }
}

impl_op_ex!(+ |a: &Vec2, b: &Vec2| -> Vec2 {
    Vec2::new(a.px + b.px, a.py + b.py, a.e + b.e)
});

/// A per-event momentum value of either kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Momentum {
    /// A full four-momentum.
    Four(Vec4),
    /// A transverse-only momentum.
    Transverse(Vec2),
}

impl Momentum {
    /// The kind of this value.
    pub fn kind(&self) -> VectorKind {
        match self {
            Momentum::Four(_) => VectorKind::FourVector,
            Momentum::Transverse(_) => VectorKind::Transverse,
        }
    }

    /// The underlying four-momentum, if this value is one.
    pub fn as_four(&self) -> Option<Vec4> {
        match self {
            Momentum::Four(v) => Some(*v),
            Momentum::Transverse(_) => None,
        }
    }

    /// The (transverse) mass.
    pub fn m(&self) -> f64 {
        match self {
            Momentum::Four(v) => v.m(),
            Momentum::Transverse(v) => v.m(),
        }
    }

    /// The transverse momentum.
    pub fn pt(&self) -> f64 {
        match self {
            Momentum::Four(v) => v.pt(),
            Momentum::Transverse(v) => v.pt(),
        }
    }

    /// The azimuthal angle.
    pub fn phi(&self) -> f64 {
        match self {
            Momentum::Four(v) => v.phi(),
            Momentum::Transverse(v) => v.phi(),
        }
    }

    /// The transverse energy.
    pub fn et(&self) -> f64 {
        match self {
            Momentum::Four(v) => v.et(),
            Momentum::Transverse(v) => v.et(),
        }
    }

    /// Momentum along the x-axis.
    pub fn px(&self) -> f64 {
        match self {
            Momentum::Four(v) => v.px,
            Momentum::Transverse(v) => v.px,
        }
    }

    /// Momentum along the y-axis.
    pub fn py(&self) -> f64 {
        match self {
            Momentum::Four(v) => v.py,
            Momentum::Transverse(v) => v.py,
        }
    }
}

/// Wrap the difference of two azimuthal angles into (−π, π].
///
/// The boundary is inclusive at +π and exclusive at −π.
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut diff = phi1 - phi2;
    while diff > PI {
        diff -= 2.0 * PI;
    }
    while diff <= -PI {
        diff += 2.0 * PI;
    }
    diff
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cylindrical_round_trip() {
        let p = Vec4::from_pt_eta_phi_m(35.2, -1.3, 2.1, 4.7);
        assert_relative_eq!(p.pt(), 35.2, epsilon = 1e-12);
        assert_relative_eq!(p.eta(), -1.3, epsilon = 1e-12);
        assert_relative_eq!(p.phi(), 2.1, epsilon = 1e-12);
        assert_relative_eq!(p.m(), 4.7, epsilon = 1e-9);
    }

    #[test]
    fn four_vector_sums() {
        let a = Vec4::new(1.0, 2.0, 3.0, 10.0);
        let b = Vec4::new(4.0, 5.0, 6.0, 11.0);
        let s = a + b;
        assert_eq!(s, Vec4::new(5.0, 7.0, 9.0, 21.0));
        assert_eq!([a, b].into_iter().sum::<Vec4>(), s);
        assert_eq!(s - b, a);
        assert_eq!(-a, Vec4::new(-1.0, -2.0, -3.0, -10.0));
    }

    #[test]
    fn back_to_back_mass() {
        let pt = 42.0;
        let a = Vec4::from_pt_eta_phi_m(pt, 0.0, 0.3, 0.0);
        let b = Vec4::from_pt_eta_phi_m(pt, 0.0, 0.3 + PI, 0.0);
        assert_relative_eq!((a + b).m(), 2.0 * pt, epsilon = 1e-9);
    }

    #[test]
    fn transverse_energy() {
        // massless central vector: et == pt == e
        let p = Vec4::from_pt_eta_phi_m(10.0, 0.0, 0.7, 0.0);
        assert_relative_eq!(p.et(), 10.0, epsilon = 1e-12);
        // forward vector carries less transverse energy than energy
        let q = Vec4::from_pt_eta_phi_m(10.0, 2.0, 0.7, 0.0);
        assert_relative_eq!(q.et(), q.e * q.pt() / q.p(), epsilon = 1e-12);
        assert!(q.et() < q.e);
        // no transverse part at all
        assert_eq!(Vec4::new(0.0, 0.0, 5.0, 5.0).et(), 0.0);
    }

    #[test]
    fn beamline_eta_is_clamped() {
        assert_eq!(Vec4::new(0.0, 0.0, 3.0, 3.0).eta(), 10e10);
        assert_eq!(Vec4::new(0.0, 0.0, -3.0, 3.0).eta(), -10e10);
        assert_eq!(Vec4::default().eta(), 0.0);
    }

    #[test]
    fn massless_transverse_vector() {
        let v = Vec2::from_phi_et_pt(1.2, 30.0, None);
        assert_relative_eq!(v.pt(), 30.0, epsilon = 1e-12);
        assert_relative_eq!(v.phi(), 1.2, epsilon = 1e-12);
        assert_relative_eq!(v.m(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn transverse_mass_sign_flip() {
        // pt > et gives a negative squared mass; the sign must survive
        let v = Vec2::from_phi_et_pt(0.0, 3.0, Some(5.0));
        assert_relative_eq!(v.m(), -4.0, epsilon = 1e-12);
        let w = Vec2::from_phi_et_pt(0.0, 5.0, Some(3.0));
        assert_relative_eq!(w.m(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn delta_phi_wrap_law() {
        for _ in 0..10000 {
            let phi1 = (fastrand::f64() - 0.5) * 20.0 * PI;
            let phi2 = (fastrand::f64() - 0.5) * 20.0 * PI;
            let d = delta_phi(phi1, phi2);
            assert!(d > -PI && d <= PI, "{d} out of range");
            // congruent to the raw difference modulo 2π
            let r = (phi1 - phi2 - d) / (2.0 * PI);
            assert_relative_eq!(r, r.round(), epsilon = 1e-9);
        }
    }

    #[test]
    fn delta_phi_boundary() {
        assert_relative_eq!(delta_phi(PI, 0.0), PI);
        assert_relative_eq!(delta_phi(0.0, PI), PI);
        assert_relative_eq!(delta_phi(3.0 * PI, 0.0), PI);
    }
}
