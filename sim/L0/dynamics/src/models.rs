//! Small reference robots.
//!
//! Each model is built from uniform slender rods so the dynamics can be
//! checked by hand. Inertias are about the center of mass.

use nalgebra::{Isometry3, Matrix3, Vector3};

use crate::joint::{JointKind, JointParams};
use crate::link::LinkParams;
use crate::robot::{Robot, RobotBuilder};
use crate::Result;

/// Length of every rod in the reference models (m).
pub const ROD_LENGTH: f64 = 2.0;

/// Inertia of a uniform rod of `mass` and `length` lying along `along`
/// (0 = x, 1 = y, 2 = z). The rod's own axis gets a small nonzero value.
#[must_use]
pub fn rod_inertia(mass: f64, length: f64, along: usize) -> Matrix3<f64> {
    let transverse = mass * length * length / 12.0;
    let mut diagonal = Vector3::repeat(transverse);
    diagonal[along.min(2)] = 1e-2 * transverse;
    Matrix3::from_diagonal(&diagonal)
}

/// A unit-mass rod of length [`ROD_LENGTH`] hanging from a fixed base
/// through a revolute joint about `z` at the origin. Its COM sits at
/// `(1, 0, 0)`. Motion is in the `x`-`y` plane.
pub fn pendulum() -> Result<Robot> {
    RobotBuilder::new()
        .link(LinkParams::new("base", 1.0))
        .link(
            LinkParams::new("rod", 1.0)
                .with_com(Isometry3::translation(1.0, 0.0, 0.0))
                .with_inertia(Matrix3::from_diagonal(&Vector3::new(0.01, 1.0 / 3.0, 1.0 / 3.0))),
        )
        .joint(JointParams::new("j1", JointKind::Revolute, "base", "rod"))
        .fixed("base")
        .build()
}

/// A planar arm of two rods of length [`ROD_LENGTH`] on a fixed base.
///
/// At rest the arm lies along `x`: `j1` at the origin, `j2` at `(2, 0, 0)`
/// and the tip of `link2` at `(4, 0, 0)`. Both joints rotate about `z`.
pub fn simple_rr() -> Result<Robot> {
    let half = ROD_LENGTH / 2.0;
    let rod = |name: &str, x: f64| {
        LinkParams::new(name, 1.0)
            .with_pose(Isometry3::translation(x, 0.0, 0.0))
            .with_com(Isometry3::translation(half, 0.0, 0.0))
            .with_inertia(rod_inertia(1.0, ROD_LENGTH, 0))
    };
    RobotBuilder::new()
        .link(LinkParams::new("base", 1.0))
        .link(rod("link1", 0.0))
        .link(rod("link2", ROD_LENGTH))
        .joint(JointParams::new("j1", JointKind::Revolute, "base", "link1"))
        .joint(
            JointParams::new("j2", JointKind::Revolute, "link1", "link2")
                .with_pose(Isometry3::translation(ROD_LENGTH, 0.0, 0.0)),
        )
        .fixed("base")
        .build()
}

/// Tip of `link2` of [`simple_rr`] in its COM frame.
#[must_use]
pub fn simple_rr_tip() -> Isometry3<f64> {
    Isometry3::translation(ROD_LENGTH / 2.0, 0.0, 0.0)
}

/// A closed planar four-bar loop in the `y`-`z` plane, all joints about `x`.
///
/// The rods form a square of side [`ROD_LENGTH`] with corners
/// `A = (0, 0, 0)`, `B = (0, 2, 0)`, `C = (0, 2, 2)` and `D = (0, 0, 2)`:
/// `l1 = AB` (fixed ground), `l2 = BC`, `l3 = CD` and `l4 = AD`. Joints are
/// `j1` at `B` (`l1` to `l2`), `j2` at `C` (`l2` to `l3`), `j3` at `D`
/// (`l3` to `l4`) and `j4` at `A` (`l1` to `l4`).
///
/// The loop closes when `q1 + q2 + q3 - q4 = 0`.
pub fn four_bar() -> Result<Robot> {
    let l = ROD_LENGTH;
    let h = l / 2.0;
    let rod = |name: &str, start: Vector3<f64>, com: Vector3<f64>, along: usize| {
        LinkParams::new(name, 1.0)
            .with_pose(Isometry3::translation(start.x, start.y, start.z))
            .with_com(Isometry3::translation(com.x, com.y, com.z))
            .with_inertia(rod_inertia(1.0, l, along))
    };
    let revolute = |name: &str, parent: &str, child: &str, at: Vector3<f64>| {
        JointParams::new(name, JointKind::Revolute, parent, child)
            .with_pose(Isometry3::translation(at.x, at.y, at.z))
            .with_axis(Vector3::x())
    };
    RobotBuilder::new()
        .link(rod("l1", Vector3::zeros(), Vector3::new(0.0, h, 0.0), 1))
        .link(rod("l2", Vector3::new(0.0, l, 0.0), Vector3::new(0.0, 0.0, h), 2))
        .link(rod("l3", Vector3::new(0.0, l, l), Vector3::new(0.0, -h, 0.0), 1))
        .link(rod("l4", Vector3::zeros(), Vector3::new(0.0, 0.0, h), 2))
        .joint(revolute("j1", "l1", "l2", Vector3::new(0.0, l, 0.0)))
        .joint(revolute("j2", "l2", "l3", Vector3::new(0.0, l, l)))
        .joint(revolute("j3", "l3", "l4", Vector3::new(0.0, 0.0, l)))
        .joint(revolute("j4", "l1", "l4", Vector3::zeros()))
        .fixed("l1")
        .build()
}
