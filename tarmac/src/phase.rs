//! Phases, resource classes, and resource-set arithmetic.
//!
//! Every aircraft traverses the three phases in a fixed order, and each
//! phase needs a fixed subset of the three resource classes. Physical
//! acquisition follows one global order (tower before gate before runway)
//! for all aircraft, which is what keeps the semaphore layer free of
//! circular waits.

use std::fmt;

// =============================================================================
// Resource Class
// =============================================================================

/// The three fungible resource classes an aircraft can hold.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ResourceClass {
    /// A runway (landing roll or takeoff roll).
    Runway,

    /// A passenger gate.
    Gate,

    /// One slot of the tower's concurrent-handling capacity.
    TowerSlot,
}

impl ResourceClass {
    /// All resource classes, in global acquisition order.
    pub const ALL: [ResourceClass; 3] = [
        ResourceClass::TowerSlot,
        ResourceClass::Gate,
        ResourceClass::Runway,
    ];
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runway => write!(f, "runway"),
            Self::Gate => write!(f, "gate"),
            Self::TowerSlot => write!(f, "tower slot"),
        }
    }
}

// =============================================================================
// Resource Need
// =============================================================================

/// A per-class subset of resources: what a phase needs, what an aircraft
/// currently holds, or what a rollback must credit back.
///
/// Each class is needed at most once per phase, so this is a set, not a
/// multiset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceNeed {
    /// Needs or holds a runway.
    pub runway: bool,

    /// Needs or holds a gate.
    pub gate: bool,

    /// Needs or holds a tower slot.
    pub tower: bool,
}

impl ResourceNeed {
    /// The empty set.
    pub fn none() -> Self {
        Self::default()
    }

    /// The set containing the given classes.
    pub fn of(classes: &[ResourceClass]) -> Self {
        let mut need = Self::none();
        for class in classes {
            need.insert(*class);
        }
        need
    }

    /// Returns true if the set contains `class`.
    pub fn contains(self, class: ResourceClass) -> bool {
        match class {
            ResourceClass::Runway => self.runway,
            ResourceClass::Gate => self.gate,
            ResourceClass::TowerSlot => self.tower,
        }
    }

    /// Adds `class` to the set.
    pub fn insert(&mut self, class: ResourceClass) {
        match class {
            ResourceClass::Runway => self.runway = true,
            ResourceClass::Gate => self.gate = true,
            ResourceClass::TowerSlot => self.tower = true,
        }
    }

    /// Removes `class` from the set.
    pub fn remove(&mut self, class: ResourceClass) {
        match class {
            ResourceClass::Runway => self.runway = false,
            ResourceClass::Gate => self.gate = false,
            ResourceClass::TowerSlot => self.tower = false,
        }
    }

    /// Returns the classes in `self` that are not in `other`.
    ///
    /// Used to turn a phase's full requirement into its remaining need,
    /// given what the aircraft already holds.
    pub fn minus(self, other: Self) -> Self {
        Self {
            runway: self.runway && !other.runway,
            gate: self.gate && !other.gate,
            tower: self.tower && !other.tower,
        }
    }

    /// Number of classes in the set.
    pub fn count(self) -> usize {
        usize::from(self.runway) + usize::from(self.gate) + usize::from(self.tower)
    }

    /// Returns true if the set is empty.
    pub fn is_empty(self) -> bool {
        self.count() == 0
    }

    /// Iterates the contained classes in global acquisition order.
    pub fn classes(self) -> impl Iterator<Item = ResourceClass> {
        ResourceClass::ALL
            .into_iter()
            .filter(move |class| self.contains(*class))
    }
}

impl fmt::Display for ResourceNeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for class in self.classes() {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{}", class)?;
            first = false;
        }
        Ok(())
    }
}

// =============================================================================
// Phase Kind
// =============================================================================

/// One of the three ordered stages of an aircraft's lifecycle.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum PhaseKind {
    /// Approach and landing roll: needs a runway and a tower slot.
    Landing,

    /// Passenger disembarkation: needs a gate and a tower slot. The tower
    /// slot is released as soon as the body completes; the gate is held for
    /// an extra occupancy interval.
    Disembarkation,

    /// Taxi and takeoff roll: needs all three classes.
    Takeoff,
}

impl PhaseKind {
    /// The three phases in lifecycle order.
    pub const ALL: [PhaseKind; 3] = [
        PhaseKind::Landing,
        PhaseKind::Disembarkation,
        PhaseKind::Takeoff,
    ];

    /// The fixed physical acquisition order for this phase.
    ///
    /// The tower slot always comes first; the relative order of gate and
    /// runway is the same for every aircraft, so no two aircraft can ever
    /// hold each other's next resource.
    pub fn acquisition_order(self) -> &'static [ResourceClass] {
        match self {
            Self::Landing => &[ResourceClass::TowerSlot, ResourceClass::Runway],
            Self::Disembarkation => &[ResourceClass::TowerSlot, ResourceClass::Gate],
            Self::Takeoff => &[
                ResourceClass::TowerSlot,
                ResourceClass::Gate,
                ResourceClass::Runway,
            ],
        }
    }

    /// The full resource requirement of this phase.
    pub fn requires(self) -> ResourceNeed {
        ResourceNeed::of(self.acquisition_order())
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<PhaseKind> {
        match self {
            Self::Landing => Some(Self::Disembarkation),
            Self::Disembarkation => Some(Self::Takeoff),
            Self::Takeoff => None,
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Landing => write!(f, "landing"),
            Self::Disembarkation => write!(f, "disembarkation"),
            Self::Takeoff => write!(f, "takeoff"),
        }
    }
}
