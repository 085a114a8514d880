//! Variable keys for time-indexed physical quantities.
//!
//! Every quantity of the dynamics graph is named by a [`DynamicsSymbol`]
//! packed into one 64-bit [`Key`]:
//!
//! ```text
//! [ tag : 8 ][ link : 8 ][ joint : 8 ][ time : 40 ]
//! ```
//!
//! A slot holding [`NO_ENTITY`] means the quantity is not attached to that
//! kind of entity (joint angles have no link, link poses have no joint).
//! Entity ids are therefore bounded by [`MAX_ENTITY_ID`] and time indices by
//! [`MAX_TIME`]. Out-of-range values are rejected before they reach a key:
//! robots when they are built, contact points when they are created, and
//! time indices by the graph builders through [`check_time`].
//!
//! The key functions are pure and stateless.

use std::fmt;

use sim_factor_graph::Key;
use sim_types::{JointId, LinkId};

use crate::error::DynamicsError;
use crate::Result;

/// Slot value meaning "no entity".
pub const NO_ENTITY: u8 = 0xFF;

/// Largest link or joint id that can be packed.
pub const MAX_ENTITY_ID: u64 = 254;

/// Number of bits holding the time index.
pub const TIME_BITS: u32 = 40;

/// Largest time index that can be packed.
pub const MAX_TIME: u64 = (1 << TIME_BITS) - 1;

/// Link center-of-mass pose.
pub const POSE: u8 = b'p';
/// Link twist.
pub const TWIST: u8 = b'V';
/// Link twist acceleration.
pub const TWIST_ACCEL: u8 = b'A';
/// Joint-side wrench on a link.
pub const WRENCH: u8 = b'F';
/// Joint torque.
pub const TORQUE: u8 = b'T';
/// Joint coordinate.
pub const JOINT_ANGLE: u8 = b'q';
/// Joint velocity.
pub const JOINT_VEL: u8 = b'v';
/// Joint acceleration.
pub const JOINT_ACCEL: u8 = b'a';
/// Step duration of a phase.
pub const TIME: u8 = b't';
/// Contact frame pose.
pub const CONTACT_POSE: u8 = b'C';

/// Decoded form of a dynamics key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DynamicsSymbol {
    /// Quantity tag.
    pub tag: u8,
    /// Link slot ([`NO_ENTITY`] if unused).
    pub link: u8,
    /// Joint slot ([`NO_ENTITY`] if unused); holds the contact id for contact poses.
    pub joint: u8,
    /// Time index.
    pub time: u64,
}

impl DynamicsSymbol {
    /// Create a symbol, rejecting ids and times outside the packing bounds.
    pub fn try_new(tag: u8, link: Option<u64>, joint: Option<u64>, time: u64) -> Result<Self> {
        if time > MAX_TIME {
            return Err(DynamicsError::IdOutOfRange {
                entity: "time index",
                value: time,
                max: MAX_TIME,
            });
        }
        Ok(Self {
            tag,
            link: pack_id("link id", link)?,
            joint: pack_id("joint id", joint)?,
            time,
        })
    }

    /// Pack into a key. The time index must not exceed [`MAX_TIME`].
    #[must_use]
    pub const fn key(self) -> Key {
        Key::new(
            ((self.tag as u64) << 56)
                | ((self.link as u64) << 48)
                | ((self.joint as u64) << 40)
                | (self.time & MAX_TIME),
        )
    }

    /// Unpack a key.
    #[must_use]
    pub const fn decode(key: Key) -> Self {
        let raw = key.raw();
        Self {
            tag: (raw >> 56) as u8,
            link: (raw >> 48) as u8,
            joint: (raw >> 40) as u8,
            time: raw & MAX_TIME,
        }
    }

    /// Link id, if the link slot is used.
    #[must_use]
    pub fn link_id(&self) -> Option<LinkId> {
        (self.link != NO_ENTITY).then(|| LinkId::new(u64::from(self.link)))
    }

    /// Joint id, if the joint slot is used.
    #[must_use]
    pub fn joint_id(&self) -> Option<JointId> {
        (self.joint != NO_ENTITY).then(|| JointId::new(u64::from(self.joint)))
    }
}

impl From<DynamicsSymbol> for Key {
    fn from(symbol: DynamicsSymbol) -> Self {
        symbol.key()
    }
}

impl fmt::Display for DynamicsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.tag))?;
        match (self.link != NO_ENTITY, self.joint != NO_ENTITY) {
            (true, true) => write!(f, "{}_{}", self.link, self.joint)?,
            (true, false) => write!(f, "{}", self.link)?,
            (false, true) => write!(f, "{}", self.joint)?,
            (false, false) => {}
        }
        write!(f, "@{}", self.time)
    }
}

fn pack_id(entity: &'static str, id: Option<u64>) -> Result<u8> {
    match id {
        None => Ok(NO_ENTITY),
        Some(id) => u8::try_from(id)
            .ok()
            .filter(|&b| b != NO_ENTITY)
            .ok_or(DynamicsError::IdOutOfRange {
                entity,
                value: id,
                max: MAX_ENTITY_ID,
            }),
    }
}

/// Reject a time index that does not fit into a key.
pub fn check_time(t: u64) -> Result<()> {
    DynamicsSymbol::try_new(TIME, None, None, t).map(|_| ())
}

/// Reject a contact id that does not fit into a key.
pub fn check_contact_id(id: u64) -> Result<()> {
    pack_id("contact id", Some(id)).map(|_| ())
}

/// Packs ids that have already been validated.
fn slot(id: u64) -> u8 {
    debug_assert!(id <= MAX_ENTITY_ID, "entity id {id} exceeds key packing bound");
    u8::try_from(id).unwrap_or(NO_ENTITY)
}

fn symbol(tag: u8, link: u8, joint: u8, t: u64) -> Key {
    debug_assert!(t <= MAX_TIME, "time index {t} exceeds key packing bound");
    DynamicsSymbol {
        tag,
        link,
        joint,
        time: t,
    }
    .key()
}

// ============================================================================
// Key functions
// ============================================================================

/// Pose of link `i` at step `t`.
#[must_use]
pub fn pose_key(i: LinkId, t: u64) -> Key {
    symbol(POSE, slot(i.raw()), NO_ENTITY, t)
}

/// Twist of link `i` at step `t`.
#[must_use]
pub fn twist_key(i: LinkId, t: u64) -> Key {
    symbol(TWIST, slot(i.raw()), NO_ENTITY, t)
}

/// Twist acceleration of link `i` at step `t`.
#[must_use]
pub fn twist_accel_key(i: LinkId, t: u64) -> Key {
    symbol(TWIST_ACCEL, slot(i.raw()), NO_ENTITY, t)
}

/// Wrench exerted by joint `j` on link `i` at step `t`.
#[must_use]
pub fn wrench_key(i: LinkId, j: JointId, t: u64) -> Key {
    symbol(WRENCH, slot(i.raw()), slot(j.raw()), t)
}

/// Torque of joint `j` at step `t`.
#[must_use]
pub fn torque_key(j: JointId, t: u64) -> Key {
    symbol(TORQUE, NO_ENTITY, slot(j.raw()), t)
}

/// Coordinate of joint `j` at step `t`.
#[must_use]
pub fn joint_angle_key(j: JointId, t: u64) -> Key {
    symbol(JOINT_ANGLE, NO_ENTITY, slot(j.raw()), t)
}

/// Velocity of joint `j` at step `t`.
#[must_use]
pub fn joint_vel_key(j: JointId, t: u64) -> Key {
    symbol(JOINT_VEL, NO_ENTITY, slot(j.raw()), t)
}

/// Acceleration of joint `j` at step `t`.
#[must_use]
pub fn joint_accel_key(j: JointId, t: u64) -> Key {
    symbol(JOINT_ACCEL, NO_ENTITY, slot(j.raw()), t)
}

/// Step duration of phase `phase`.
#[must_use]
pub fn time_key(phase: u64) -> Key {
    symbol(TIME, NO_ENTITY, NO_ENTITY, phase)
}

/// Pose of contact `contact_id` on link `i` at step `t`.
#[must_use]
pub fn contact_pose_key(i: LinkId, contact_id: u64, t: u64) -> Key {
    symbol(CONTACT_POSE, slot(i.raw()), slot(contact_id), t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_display() {
        let f = DynamicsSymbol::decode(wrench_key(LinkId::new(1), JointId::new(2), 0));
        assert_eq!(f.to_string(), "F1_2@0");
        let q = DynamicsSymbol::decode(joint_angle_key(JointId::new(3), 7));
        assert_eq!(q.to_string(), "q3@7");
        assert_eq!(DynamicsSymbol::decode(pose_key(LinkId::new(4), 2)).to_string(), "p4@2");
        assert_eq!(DynamicsSymbol::decode(time_key(5)).to_string(), "t@5");
    }

    #[test]
    fn test_decode_entities() {
        let s = DynamicsSymbol::decode(wrench_key(LinkId::new(9), JointId::new(0), 11));
        assert_eq!(s.tag, WRENCH);
        assert_eq!(s.link_id(), Some(LinkId::new(9)));
        assert_eq!(s.joint_id(), Some(JointId::new(0)));
        assert_eq!(s.time, 11);

        let s = DynamicsSymbol::decode(torque_key(JointId::new(4), 1));
        assert_eq!(s.link_id(), None);
        assert_eq!(s.joint_id(), Some(JointId::new(4)));
    }

    #[test]
    fn test_wrench_sides_are_distinct() {
        let j = JointId::new(1);
        assert_ne!(
            wrench_key(LinkId::new(0), j, 0),
            wrench_key(LinkId::new(1), j, 0)
        );
    }

    #[test]
    fn test_try_new_bounds() {
        assert!(DynamicsSymbol::try_new(POSE, Some(254), None, 0).is_ok());
        assert!(matches!(
            DynamicsSymbol::try_new(POSE, Some(255), None, 0),
            Err(DynamicsError::IdOutOfRange { entity: "link id", value: 255, .. })
        ));
        assert!(DynamicsSymbol::try_new(TORQUE, None, Some(1000), 0).is_err());
        assert!(DynamicsSymbol::try_new(TIME, None, None, MAX_TIME + 1).is_err());
    }

    #[test]
    fn test_tags_do_not_collide() {
        let (i, j) = (LinkId::new(1), JointId::new(1));
        let keys: BTreeSet<Key> = [
            pose_key(i, 0),
            twist_key(i, 0),
            twist_accel_key(i, 0),
            wrench_key(i, j, 0),
            torque_key(j, 0),
            joint_angle_key(j, 0),
            joint_vel_key(j, 0),
            joint_accel_key(j, 0),
            time_key(0),
            contact_pose_key(i, 1, 0),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn test_time_bounds() {
        assert!(check_time(MAX_TIME).is_ok());
        assert!(matches!(
            check_time(MAX_TIME + 1),
            Err(DynamicsError::IdOutOfRange { entity: "time index", .. })
        ));
        let last = DynamicsSymbol::decode(pose_key(LinkId::new(1), MAX_TIME));
        assert_eq!(last.time, MAX_TIME);
        assert_ne!(pose_key(LinkId::new(1), MAX_TIME), pose_key(LinkId::new(1), 0));
    }

    #[test]
    fn test_contact_id_bounds() {
        assert!(check_contact_id(MAX_ENTITY_ID).is_ok());
        assert!(matches!(
            check_contact_id(255),
            Err(DynamicsError::IdOutOfRange { entity: "contact id", value: 255, .. })
        ));
        assert!(check_contact_id(300).is_err());
    }

    /// Every key function, with the arguments it actually packs.
    fn build(kind: u8, link: u64, joint: u64, t: u64) -> (Key, (u8, u64, u64, u64)) {
        let (i, j) = (LinkId::new(link), JointId::new(joint));
        let none = u64::from(NO_ENTITY);
        match kind {
            0 => (pose_key(i, t), (kind, link, none, t)),
            1 => (twist_key(i, t), (kind, link, none, t)),
            2 => (twist_accel_key(i, t), (kind, link, none, t)),
            3 => (wrench_key(i, j, t), (kind, link, joint, t)),
            4 => (torque_key(j, t), (kind, none, joint, t)),
            5 => (joint_angle_key(j, t), (kind, none, joint, t)),
            6 => (joint_vel_key(j, t), (kind, none, joint, t)),
            7 => (joint_accel_key(j, t), (kind, none, joint, t)),
            8 => (time_key(t), (kind, none, none, t)),
            _ => (contact_pose_key(i, joint, t), (kind, link, joint, t)),
        }
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            tag in prop::sample::select(vec![POSE, TWIST, TWIST_ACCEL, WRENCH, TORQUE, JOINT_ANGLE]),
            link in 0u64..=MAX_ENTITY_ID,
            joint in 0u64..=MAX_ENTITY_ID,
            time in 0u64..=MAX_TIME,
        ) {
            let symbol = DynamicsSymbol::try_new(tag, Some(link), Some(joint), time).unwrap();
            prop_assert_eq!(DynamicsSymbol::decode(symbol.key()), symbol);
        }

        #[test]
        fn prop_collision_free(
            a in (0u8..10, 0u64..=MAX_ENTITY_ID, 0u64..=MAX_ENTITY_ID, 0u64..=MAX_TIME),
            b in (0u8..10, 0u64..=MAX_ENTITY_ID, 0u64..=MAX_ENTITY_ID, 0u64..=MAX_TIME),
        ) {
            let (ka, ida) = build(a.0, a.1, a.2, a.3);
            let (kb, idb) = build(b.0, b.1, b.2, b.3);
            prop_assert_eq!(ka == kb, ida == idb);
        }

        #[test]
        fn prop_collision_free_near_bounds(
            a in (0u8..10, (MAX_ENTITY_ID - 2)..=MAX_ENTITY_ID, (MAX_TIME - 3)..=MAX_TIME),
            b in (0u8..10, (MAX_ENTITY_ID - 2)..=MAX_ENTITY_ID, (MAX_TIME - 3)..=MAX_TIME),
        ) {
            let (ka, ida) = build(a.0, a.1, a.1, a.2);
            let (kb, idb) = build(b.0, b.1, b.1, b.2);
            prop_assert_eq!(ka == kb, ida == idb);
        }
    }
}
