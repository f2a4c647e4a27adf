use crate::mapping::{self, MappingKind, QuantumOperation};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;
use std::hash::Hash;

/// A closed set of boolean properties that can refine a type
pub trait Property: Copy + Eq + Hash + fmt::Debug + fmt::Display + 'static {
    const ALL: &'static [Self];

    fn erase(self) -> AnyProperty;
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum TopologyProperty {
    Continuous,
    Connected,
    Compact,
    Hausdorff,
    Metrizable,
    T0,
    T1,
    T2,
    Regular,
    Normal,
    Paracompact,
    LocallyCompact,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum QuantumProperty {
    Unitary,
    Normalized,
    Entangled,
    Superposition,
    Coherent,
}

/// A property of either refinement dimension
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AnyProperty {
    Topology(TopologyProperty),
    Quantum(QuantumProperty),
}

impl Property for TopologyProperty {
    const ALL: &'static [Self] = &[
        TopologyProperty::Continuous,
        TopologyProperty::Connected,
        TopologyProperty::Compact,
        TopologyProperty::Hausdorff,
        TopologyProperty::Metrizable,
        TopologyProperty::T0,
        TopologyProperty::T1,
        TopologyProperty::T2,
        TopologyProperty::Regular,
        TopologyProperty::Normal,
        TopologyProperty::Paracompact,
        TopologyProperty::LocallyCompact,
    ];

    fn erase(self) -> AnyProperty {
        AnyProperty::Topology(self)
    }
}

impl Property for QuantumProperty {
    const ALL: &'static [Self] = &[
        QuantumProperty::Unitary,
        QuantumProperty::Normalized,
        QuantumProperty::Entangled,
        QuantumProperty::Superposition,
        QuantumProperty::Coherent,
    ];

    fn erase(self) -> AnyProperty {
        AnyProperty::Quantum(self)
    }
}

impl AnyProperty {
    /// Looks a property up by its declared name, case-insensitively.
    ///
    /// Both `locally_compact` and `LOCALLY_COMPACT` are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        TopologyProperty::ALL
            .iter()
            .find(|p| p.to_string() == upper)
            .map(|p| p.erase())
            .or_else(|| {
                QuantumProperty::ALL
                    .iter()
                    .find(|p| p.to_string() == upper)
                    .map(|p| p.erase())
            })
    }
}

/// What a registry knows about a single property.
///
/// Unset properties verify as false; the distinction only matters for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PropertyState {
    True,
    False,
    Unset,
}

impl From<Option<bool>> for PropertyState {
    fn from(v: Option<bool>) -> Self {
        match v {
            Some(true) => PropertyState::True,
            Some(false) => PropertyState::False,
            None => PropertyState::Unset,
        }
    }
}

/// A property that was required but does not hold
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Missing {
    pub property: AnyProperty,
    pub state: PropertyState,
}

/// Per-type property registry.
///
/// Mutated through `set_property` while types are being inferred, read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Traits<P: Property> {
    set: SmallVec<[(P, bool); 4]>,
}

pub type TopologyTraits = Traits<TopologyProperty>;
pub type QuantumTraits = Traits<QuantumProperty>;

impl<P: Property> Default for Traits<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Property> Traits<P> {
    pub fn new() -> Self {
        Self {
            set: SmallVec::new(),
        }
    }

    /// Overwrites the property, returning what it was before
    pub fn set_property(&mut self, prop: P, value: bool) -> Option<bool> {
        match self.set.iter_mut().find(|(p, _)| *p == prop) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.set.push((prop, value));
                None
            }
        }
    }

    #[must_use]
    pub fn with(mut self, prop: P, value: bool) -> Self {
        self.set_property(prop, value);
        self
    }

    pub fn get(&self, prop: P) -> Option<bool> {
        self.set
            .iter()
            .find_map(|(p, v)| if *p == prop { Some(*v) } else { None })
    }

    pub fn state(&self, prop: P) -> PropertyState {
        self.get(prop).into()
    }

    pub fn verify_property(&self, prop: P) -> bool {
        self.get(prop).unwrap_or(false)
    }

    pub fn verify_all(&self, props: &[P]) -> bool {
        props.iter().all(|p| self.verify_property(*p))
    }

    /// Every property out of `props` that does not hold, in the given order
    pub fn missing(&self, props: &[P]) -> SmallVec<[Missing; 2]> {
        props
            .iter()
            .filter(|p| !self.verify_property(**p))
            .map(|p| Missing {
                property: p.erase(),
                state: self.state(*p),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (P, bool)> + '_ {
        self.set.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }
}

/// `antecedents` all holding forces `consequent` to hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    pub antecedents: &'static [TopologyProperty],
    pub consequent: TopologyProperty,
}

macro_rules! rule {
    ($($a:ident)&+ => $c:ident) => {
        Rule {
            antecedents: &[$(TopologyProperty::$a),+],
            consequent: TopologyProperty::$c,
        }
    };
}

/// Implications between the separation axioms and the covering properties
pub const SEPARATION_RULES: &[Rule] = &[
    rule!(T2 => T1),
    rule!(T1 => T0),
    rule!(Hausdorff => T2),
    rule!(T2 => Hausdorff),
    rule!(Metrizable => Hausdorff),
    rule!(Metrizable => Normal),
    rule!(Metrizable => Paracompact),
    rule!(Normal & T1 => Regular),
    rule!(Compact => Paracompact),
    rule!(Compact => LocallyCompact),
    rule!(Paracompact & Hausdorff => Normal),
];

impl Rule {
    fn fires(&self, traits: &TopologyTraits) -> bool {
        traits.verify_all(self.antecedents)
    }

    fn violated_by(&self, traits: &TopologyTraits) -> bool {
        self.fires(traits) && traits.get(self.consequent) == Some(false)
    }
}

impl Traits<TopologyProperty> {
    pub fn verify_path_connected(&self) -> bool {
        self.verify_property(TopologyProperty::Connected)
            && self.verify_property(TopologyProperty::Continuous)
    }

    pub fn verify_manifold(&self) -> bool {
        self.verify_property(TopologyProperty::Hausdorff)
            && self.verify_property(TopologyProperty::Metrizable)
    }

    pub fn verify_mapping(&self, kind: MappingKind, target: &TopologyTraits) -> bool {
        mapping::verify_mapping(kind, self, target)
    }

    pub fn compose_transformations(&self, transforms: &[&dyn Fn(&Self) -> bool]) -> bool {
        transforms.iter().all(|transform| transform(self))
    }

    /// The first implication whose antecedents hold while its consequent was explicitly denied
    pub fn violated_rule(&self) -> Option<&'static Rule> {
        SEPARATION_RULES.iter().find(|rule| rule.violated_by(self))
    }

    pub fn verify_axioms(&self) -> bool {
        self.violated_rule().is_none()
    }

    /// Forward-chains `SEPARATION_RULES` into unset properties until nothing changes.
    ///
    /// Explicitly denied properties are left alone; see `violated_rule`.
    pub fn saturate(&mut self) -> SmallVec<[TopologyProperty; 4]> {
        let mut derived = SmallVec::new();
        loop {
            let next = SEPARATION_RULES
                .iter()
                .find(|rule| rule.fires(self) && self.get(rule.consequent).is_none());

            match next {
                Some(rule) => {
                    self.set_property(rule.consequent, true);
                    derived.push(rule.consequent);
                }
                None => break derived,
            }
        }
    }
}

impl Traits<QuantumProperty> {
    pub fn verify_quantum_gate(&self) -> bool {
        self.verify_property(QuantumProperty::Unitary)
            && self.verify_property(QuantumProperty::Coherent)
    }

    pub fn verify_measurement(&self) -> bool {
        self.verify_property(QuantumProperty::Normalized)
    }

    pub fn verify_entanglement_preservation(&self, target: &QuantumTraits) -> bool {
        !self.verify_property(QuantumProperty::Entangled)
            || target.verify_property(QuantumProperty::Entangled)
    }

    pub fn verify_operation(&self, op: QuantumOperation, target: &QuantumTraits) -> bool {
        mapping::verify_operation(op, self, target)
    }

    /// An entangled state cannot be declared to not be in superposition
    pub fn verify_consistent(&self) -> bool {
        !(self.verify_property(QuantumProperty::Entangled)
            && self.get(QuantumProperty::Superposition) == Some(false))
    }
}

impl fmt::Display for TopologyProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TopologyProperty::Continuous => "CONTINUOUS",
            TopologyProperty::Connected => "CONNECTED",
            TopologyProperty::Compact => "COMPACT",
            TopologyProperty::Hausdorff => "HAUSDORFF",
            TopologyProperty::Metrizable => "METRIZABLE",
            TopologyProperty::T0 => "T0",
            TopologyProperty::T1 => "T1",
            TopologyProperty::T2 => "T2",
            TopologyProperty::Regular => "REGULAR",
            TopologyProperty::Normal => "NORMAL",
            TopologyProperty::Paracompact => "PARACOMPACT",
            TopologyProperty::LocallyCompact => "LOCALLY_COMPACT",
        };
        name.fmt(f)
    }
}

impl fmt::Display for QuantumProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            QuantumProperty::Unitary => "UNITARY",
            QuantumProperty::Normalized => "NORMALIZED",
            QuantumProperty::Entangled => "ENTANGLED",
            QuantumProperty::Superposition => "SUPERPOSITION",
            QuantumProperty::Coherent => "COHERENT",
        };
        name.fmt(f)
    }
}

impl fmt::Display for AnyProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnyProperty::Topology(p) => p.fmt(f),
            AnyProperty::Quantum(p) => p.fmt(f),
        }
    }
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.state {
            PropertyState::Unset => write!(f, "{} (unset)", self.property),
            PropertyState::False => write!(f, "{} (false)", self.property),
            PropertyState::True => self.property.fmt(f),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} => {}",
            self.antecedents.iter().format(" & "),
            self.consequent
        )
    }
}

impl<P: Property> fmt::Debug for Traits<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<P: Property> fmt::Display for Traits<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter().format_with(", ", |(p, v), f| if v {
                f(&p)
            } else {
                f(&format_args!("!{}", p))
            })
        )
    }
}
