//! Port descriptors for the process core.
//!
//! Each process declares named input and output ports. A port's
//! [`PortInfo`] records its data type, flags, frequency and description.
//! Infos are shared as `Arc<PortInfo>` and never mutated in place: retyping
//! or changing a frequency swaps in a new info, and both are refused once the
//! process is initialized.

use crate::pipeline::error::{ProcessError, ProcessResult};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Type string meaning "any concrete type is acceptable".
pub const TYPE_ANY: &str = "_any";
/// Type string of trigger-only ports; no payload ever flows.
pub const TYPE_NONE: &str = "_none";
/// Type string of ports the process resolves itself once configured.
pub const TYPE_DATA_DEPENDENT: &str = "_data_dependent";
/// Prefix of flow-dependent type strings; the remainder is the tag.
pub const TYPE_FLOW_DEPENDENT: &str = "_flow_dependent/";

/// Reserved output port carrying the process status.
pub const PORT_HEARTBEAT: &str = "_heartbeat";

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// The data type of a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PortType {
    /// A real type identifier, e.g. `"image"`.
    Concrete(String),
    /// Accepts any concrete type and never resolves itself.
    Any,
    /// Trigger-only; legal to leave unresolved forever.
    None,
    /// Resolved by the process from its own configuration.
    DataDependent,
    /// Resolved to whatever its peer (or co-tagged ports) resolve to.
    /// An empty tag means the port is in a class of its own.
    FlowDependent(String),
}

impl PortType {
    pub fn concrete(name: impl Into<String>) -> Self {
        PortType::Concrete(name.into())
    }

    pub fn flow_dependent(tag: impl Into<String>) -> Self {
        PortType::FlowDependent(tag.into())
    }

    /// True for the sentinels that wait on negotiation.
    pub fn is_dependent(&self) -> bool {
        matches!(self, PortType::DataDependent | PortType::FlowDependent(_))
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, PortType::Concrete(_))
    }

    /// The tag of a tagged flow-dependent type.
    pub fn flow_tag(&self) -> Option<&str> {
        match self {
            PortType::FlowDependent(tag) if !tag.is_empty() => Some(tag),
            _ => None,
        }
    }

    /// Whether data of type `other` may cross a connection to this port.
    pub fn accepts(&self, other: &PortType) -> bool {
        match (self, other) {
            (PortType::Any, _) | (_, PortType::Any) => true,
            (PortType::None, _) | (_, PortType::None) => true,
            (a, b) if a.is_dependent() || b.is_dependent() => true,
            (PortType::Concrete(a), PortType::Concrete(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::Concrete(name) => f.write_str(name),
            PortType::Any => f.write_str(TYPE_ANY),
            PortType::None => f.write_str(TYPE_NONE),
            PortType::DataDependent => f.write_str(TYPE_DATA_DEPENDENT),
            PortType::FlowDependent(tag) => write!(f, "{TYPE_FLOW_DEPENDENT}{tag}"),
        }
    }
}

impl FromStr for PortType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            TYPE_ANY => PortType::Any,
            TYPE_NONE => PortType::None,
            TYPE_DATA_DEPENDENT => PortType::DataDependent,
            other => match other.strip_prefix(TYPE_FLOW_DEPENDENT) {
                Some(tag) => PortType::FlowDependent(tag.to_string()),
                None => PortType::Concrete(other.to_string()),
            },
        })
    }
}

impl From<&str> for PortType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<String> for PortType {
    fn from(s: String) -> Self {
        PortType::from(s.as_str())
    }
}

impl Serialize for PortType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A flag on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PortFlag {
    /// The port must be connected; its data participates in sync checks.
    #[serde(rename = "_required")]
    Required,
    /// Input may be supplied from the `static/<port>` config key instead.
    #[serde(rename = "_static")]
    InputStatic,
    /// The process modifies received data.
    #[serde(rename = "_mutable")]
    InputMutable,
    /// A connection here is not a dependency for topological ordering.
    #[serde(rename = "_nodep")]
    InputNoDep,
    /// Receivers may not modify the data.
    #[serde(rename = "_const")]
    OutputConst,
    /// The data is shared between receivers.
    #[serde(rename = "_shared")]
    OutputShared,
}

impl PortFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            PortFlag::Required => "_required",
            PortFlag::InputStatic => "_static",
            PortFlag::InputMutable => "_mutable",
            PortFlag::InputNoDep => "_nodep",
            PortFlag::OutputConst => "_const",
            PortFlag::OutputShared => "_shared",
        }
    }
}

impl fmt::Display for PortFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortFlag {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_required" => Ok(PortFlag::Required),
            "_static" => Ok(PortFlag::InputStatic),
            "_mutable" => Ok(PortFlag::InputMutable),
            "_nodep" => Ok(PortFlag::InputNoDep),
            "_const" => Ok(PortFlag::OutputConst),
            "_shared" => Ok(PortFlag::OutputShared),
            other => Err(ProcessError::UnknownFlag(other.to_string())),
        }
    }
}

/// Set of flags on a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortFlags(BTreeSet<PortFlag>);

impl PortFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for the common `{required}` set.
    pub fn required() -> Self {
        Self::new().with(PortFlag::Required)
    }

    pub fn with(mut self, flag: PortFlag) -> Self {
        self.0.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: PortFlag) -> bool {
        self.0.insert(flag)
    }

    #[inline]
    pub fn contains(&self, flag: PortFlag) -> bool {
        self.0.contains(&flag)
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.contains(PortFlag::Required)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.contains(PortFlag::InputStatic)
    }

    #[inline]
    pub fn is_nodep(&self) -> bool {
        self.contains(PortFlag::InputNoDep)
    }

    pub fn iter(&self) -> impl Iterator<Item = PortFlag> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PortFlag> for PortFlags {
    fn from_iter<I: IntoIterator<Item = PortFlag>>(iter: I) -> Self {
        PortFlags(iter.into_iter().collect())
    }
}

/// Tokens a port produces or consumes per step, as a rational.
///
/// Valid frequencies are integral when at least one (`3`), reciprocal when
/// below one (`1/3`), or zero, meaning unconstrained.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency {
    num: u32,
    den: u32,
}

impl Frequency {
    pub const UNCONSTRAINED: Frequency = Frequency { num: 0, den: 1 };
    pub const ONE: Frequency = Frequency { num: 1, den: 1 };

    /// Build `num/den`, reduced. Rejects zero denominators and fractions that
    /// are neither integral nor reciprocal after reduction.
    pub fn new(num: u32, den: u32) -> ProcessResult<Self> {
        if den == 0 {
            return Err(ProcessError::InvalidFrequency(format!("{num}/0")));
        }
        if num == 0 {
            return Ok(Self::UNCONSTRAINED);
        }
        let g = gcd(num, den);
        let (n, d) = (num / g, den / g);
        if n != 1 && d != 1 {
            return Err(ProcessError::InvalidFrequency(format!("{num}/{den}")));
        }
        Ok(Self { num: n, den: d })
    }

    /// `n` tokens per step.
    pub const fn integral(n: u32) -> Self {
        Self { num: n, den: 1 }
    }

    /// One token every `n` steps.
    pub fn reciprocal(n: u32) -> ProcessResult<Self> {
        Self::new(1, n)
    }

    #[inline]
    pub fn numerator(self) -> u32 {
        self.num
    }

    #[inline]
    pub fn denominator(self) -> u32 {
        self.den
    }

    #[inline]
    pub fn is_unconstrained(self) -> bool {
        self.num == 0
    }

    /// How many tokens to drain from an input on a skipped step.
    ///
    /// Fractional and unconstrained ports drain a single token.
    pub fn tokens_per_step(self) -> usize {
        if self.den == 1 && self.num > 0 {
            self.num as usize
        } else {
            1
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl FromStr for Frequency {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ProcessError::InvalidFrequency(s.to_string());
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s.trim(), "1"),
        };
        let num = num.parse::<u32>().map_err(|_| bad())?;
        let den = den.parse::<u32>().map_err(|_| bad())?;
        Frequency::new(num, den)
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Everything known about one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    #[serde(rename = "type")]
    pub port_type: PortType,
    pub flags: PortFlags,
    pub description: String,
    pub frequency: Frequency,
}

impl PortInfo {
    /// A port with frequency one.
    pub fn new(
        port_type: impl Into<PortType>,
        flags: PortFlags,
        description: impl Into<String>,
    ) -> Self {
        Self {
            port_type: port_type.into(),
            flags,
            description: description.into(),
            frequency: Frequency::ONE,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub(crate) fn retyped(&self, port_type: PortType) -> Self {
        Self {
            port_type,
            ..self.clone()
        }
    }
}
