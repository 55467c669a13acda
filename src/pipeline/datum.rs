//! Datums, the tokens that travel over edges.
//!
//! A `Datum` carries either a payload or a status marker. Runtime faults
//! (desynchronized or missing input) never surface as errors; they travel
//! downstream as `Empty`/`Error`/`Complete` datums so consumers decide how to
//! react. Payloads are shared (`Arc`) so fan-out to several edges does not
//! copy the data.

use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Status of a datum, ordered by severity.
///
/// The derived order is the combination rule for several inputs:
/// `Data < Empty < Error < Complete`, so the aggregate status of a set of
/// inputs is simply the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatumStatus {
    /// Ordinary data with a payload.
    Data,
    /// No data for this step.
    Empty,
    /// Something upstream went wrong.
    Error,
    /// The upstream process is finished.
    Complete,
}

impl fmt::Display for DatumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatumStatus::Data => "data",
            DatumStatus::Empty => "empty",
            DatumStatus::Error => "error",
            DatumStatus::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Shared, type-erased payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A single token on an edge.
#[derive(Clone)]
pub struct Datum {
    status: DatumStatus,
    payload: Option<Payload>,
    error: Option<String>,
}

impl Datum {
    /// Ordinary datum holding `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_payload(Arc::new(value))
    }

    /// Ordinary datum around an existing shared payload.
    pub fn from_payload(payload: Payload) -> Self {
        Self {
            status: DatumStatus::Data,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self::marker(DatumStatus::Empty)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: DatumStatus::Error,
            payload: None,
            error: Some(message.into()),
        }
    }

    pub fn complete() -> Self {
        Self::marker(DatumStatus::Complete)
    }

    /// A payload-less datum with the given status.
    pub fn marker(status: DatumStatus) -> Self {
        Self {
            status,
            payload: None,
            error: None,
        }
    }

    #[inline]
    pub fn status(&self) -> DatumStatus {
        self.status
    }

    #[inline]
    pub fn is_data(&self) -> bool {
        self.status == DatumStatus::Data
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Borrow the payload as `T`, if it holds one.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datum")
            .field("status", &self.status)
            .field("has_payload", &self.payload.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// Position marker of a datum within its stream.
///
/// Each output port numbers the datums it emits, starting at zero. Inputs are
/// synchronized when their head datums carry equal stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Stamp(pub u64);

impl Stamp {
    #[inline]
    pub fn index(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn next(self) -> Stamp {
        Stamp(self.0 + 1)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What actually travels over an edge: a datum plus its stamp.
#[derive(Debug, Clone)]
pub struct EdgeDatum {
    pub datum: Datum,
    pub stamp: Stamp,
}

impl EdgeDatum {
    pub fn new(datum: Datum, stamp: Stamp) -> Self {
        Self { datum, stamp }
    }

    #[inline]
    pub fn status(&self) -> DatumStatus {
        self.datum.status()
    }
}
