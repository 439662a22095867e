//! Keyed storage for streams and parameterisations.

use crate::{StateError, StreamParameterization};
use context::{Cfg, OverridingStateProvider, StateProvider};
use core::fmt;
use primitives::{
    ArithmeticError, NameKind, RangeViolation, StreamId, Unit, UnknownName, Value,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    string::String,
};
use units::UnitConverter;

/// Identifies one substance within one application.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubstanceKey {
    /// The demand category, e.g. "domestic refrigeration".
    pub application: String,
    /// The substance name, e.g. "HFC-134a".
    pub substance: String,
}

impl SubstanceKey {
    /// Creates a key.
    pub fn new(application: impl Into<String>, substance: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            substance: substance.into(),
        }
    }
}

impl fmt::Display for SubstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.application, self.substance)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct SubstanceRecord {
    streams: BTreeMap<StreamId, Value>,
    params: StreamParameterization,
    enabled: BTreeSet<StreamId>,
}

impl SubstanceRecord {
    fn new() -> Self {
        let mut streams = BTreeMap::new();
        for stream in StreamId::CONCRETE {
            streams.insert(stream, Value::of(0.0, stream.base_unit()));
        }
        Self {
            streams,
            params: StreamParameterization::new(),
            enabled: BTreeSet::new(),
        }
    }

    fn stored(&self, stream: StreamId) -> Value {
        self.streams[&stream]
    }
}

/// Holds every per-(application, substance) stream and parameterisation.
///
/// Iteration order over substances is the sorted (application, substance)
/// order, which keeps result emission deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamKeeper {
    records: BTreeMap<SubstanceKey, SubstanceRecord>,
}

impl StreamKeeper {
    /// Creates an empty keeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the substance if absent, with every stream at zero.
    pub fn ensure_substance(&mut self, application: &str, substance: &str) {
        self.records
            .entry(SubstanceKey::new(application, substance))
            .or_insert_with(SubstanceRecord::new);
    }

    /// Whether the substance exists.
    pub fn has_substance(&self, application: &str, substance: &str) -> bool {
        self.records
            .contains_key(&SubstanceKey::new(application, substance))
    }

    /// Every known substance, in sorted order.
    pub fn substances(&self) -> impl Iterator<Item = &SubstanceKey> {
        self.records.keys()
    }

    /// Marks a sales substream as actively traded by the substance.
    pub fn enable(
        &mut self,
        application: &str,
        substance: &str,
        stream: StreamId,
    ) -> Result<(), StateError> {
        if !stream.is_charged_substream() {
            return Err(UnknownName::new(NameKind::Stream, stream.as_str()).into());
        }
        self.record_mut(application, substance)?.enabled.insert(stream);
        Ok(())
    }

    /// Whether a sales substream has been enabled.
    pub fn is_enabled(&self, application: &str, substance: &str, stream: StreamId) -> bool {
        self.record(application, substance)
            .map(|r| r.enabled.contains(&stream))
            .unwrap_or(false)
    }

    /// Reads a stream. `sales` reads as `domestic + import` in kg.
    pub fn get_stream(
        &self,
        application: &str,
        substance: &str,
        stream: StreamId,
    ) -> Result<Value, StateError> {
        let record = self.record(application, substance)?;
        if stream == StreamId::Sales {
            let total = record.stored(StreamId::Domestic).magnitude()
                + record.stored(StreamId::Import).magnitude();
            return Ok(Value::of(total, Unit::Kg));
        }
        Ok(record.stored(stream))
    }

    /// Writes a stream, converting into its base unit first.
    ///
    /// A write to `sales` distributes over `domestic` and `import` by their
    /// current kg share; with a zero total the split is an even 50/50. A
    /// substream write denominated in equipment units resolves through that
    /// substream's own initial charge, which must be nonzero.
    pub fn set_stream<P: StateProvider>(
        &mut self,
        application: &str,
        substance: &str,
        stream: StreamId,
        value: &Value,
        state: &P,
        cfg: &Cfg,
    ) -> Result<(), StateError> {
        if stream == StreamId::Sales {
            return self.set_sales(application, substance, value, state, cfg);
        }
        let record = self.record(application, substance)?;
        let in_units = value
            .unit()
            .numerator()
            .is_some_and(Unit::is_population);
        let converted = if stream.is_charged_substream() && in_units {
            let charge = record.params.initial_charge(stream)?;
            if charge.is_zero() {
                return Err(ArithmeticError::ZeroInitialCharge { stream }.into());
            }
            let overridden =
                OverridingStateProvider::new(state).with_amortized_unit_volume(charge);
            UnitConverter::new(overridden).convert_to(value, stream.base_unit())?
        } else {
            UnitConverter::new(state).convert_to(value, stream.base_unit())?
        };
        let converted = guard(converted, stream, cfg)?;
        self.record_mut(application, substance)?
            .streams
            .insert(stream, converted);
        Ok(())
    }

    /// Copies `equipment` into `priorEquipment` and resets parameterisations
    /// for every substance. Other streams carry their values forward.
    pub fn increment_year(&mut self) {
        for record in self.records.values_mut() {
            let equipment = record.stored(StreamId::Equipment);
            record.streams.insert(StreamId::PriorEquipment, equipment);
            record.params = StreamParameterization::new();
        }
    }

    /// The parameterisation of a substance.
    pub fn parameterization(
        &self,
        application: &str,
        substance: &str,
    ) -> Result<&StreamParameterization, StateError> {
        Ok(&self.record(application, substance)?.params)
    }

    /// Mutable access to the parameterisation of a substance.
    pub fn parameterization_mut(
        &mut self,
        application: &str,
        substance: &str,
    ) -> Result<&mut StreamParameterization, StateError> {
        Ok(&mut self.record_mut(application, substance)?.params)
    }

    fn set_sales<P: StateProvider>(
        &mut self,
        application: &str,
        substance: &str,
        value: &Value,
        state: &P,
        cfg: &Cfg,
    ) -> Result<(), StateError> {
        let record = self.record(application, substance)?;
        let domestic = record.stored(StreamId::Domestic).magnitude();
        let import = record.stored(StreamId::Import).magnitude();
        let total = domestic + import;
        let (domestic_share, import_share) = if total > 0.0 {
            (domestic / total, import / total)
        } else {
            (0.5, 0.5)
        };
        let incoming = UnitConverter::new(state).convert_to(value, Unit::Kg)?;
        let incoming = guard(incoming, StreamId::Sales, cfg)?;
        let record = self.record_mut(application, substance)?;
        record.streams.insert(
            StreamId::Domestic,
            Value::of(incoming.magnitude() * domestic_share, Unit::Kg),
        );
        record.streams.insert(
            StreamId::Import,
            Value::of(incoming.magnitude() * import_share, Unit::Kg),
        );
        Ok(())
    }

    fn record(&self, application: &str, substance: &str) -> Result<&SubstanceRecord, StateError> {
        self.records
            .get(&SubstanceKey::new(application, substance))
            .ok_or_else(|| UnknownName::new(NameKind::Substance, substance).into())
    }

    fn record_mut(
        &mut self,
        application: &str,
        substance: &str,
    ) -> Result<&mut SubstanceRecord, StateError> {
        self.records
            .get_mut(&SubstanceKey::new(application, substance))
            .ok_or_else(|| UnknownName::new(NameKind::Substance, substance).into())
    }
}

/// Applies the NaN and non-negativity guards to a converted value.
fn guard(value: Value, stream: StreamId, cfg: &Cfg) -> Result<Value, StateError> {
    if cfg.check_nan && !value.is_finite() {
        return Err(ArithmeticError::NotFinite { stream }.into());
    }
    if cfg.check_non_negative && value.magnitude() < 0.0 {
        return Err(RangeViolation {
            stream,
            magnitude: value.magnitude(),
        }
        .into());
    }
    Ok(value)
}
