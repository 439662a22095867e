//! Names of the per-(application, substance) quantities the engine tracks.

use crate::Unit;
use core::fmt;

/// A named stream of a substance within an application.
///
/// Every concrete stream has a fixed base unit; values written to it are
/// converted to that unit before storage. `sales` is virtual: it reads as
/// `domestic + import` and writes distribute over those substreams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamId {
    /// Domestically manufactured substance, kg.
    Domestic,
    /// Imported substance, kg.
    Import,
    /// Exported substance, kg. Tracked outflow only; not part of `sales`.
    Export,
    /// Recycled substance recovered from servicing, kg.
    Recycle,
    /// Greenhouse-gas consumption attributed to manufacture, tCO2e.
    Consumption,
    /// Equipment population at the current year, units.
    Equipment,
    /// Equipment population carried in from the prior year, units.
    PriorEquipment,
    /// Equipment added during the current year, units.
    NewEquipment,
    /// Emissions from servicing the installed base, tCO2e.
    RechargeEmissions,
    /// Emissions released at equipment end of life, tCO2e.
    EolEmissions,
    /// Virtual total of `domestic + import`, kg.
    Sales,
}

impl StreamId {
    /// Every concrete (stored) stream, in storage order.
    pub const CONCRETE: [Self; 10] = [
        Self::Domestic,
        Self::Import,
        Self::Export,
        Self::Recycle,
        Self::Consumption,
        Self::Equipment,
        Self::PriorEquipment,
        Self::NewEquipment,
        Self::RechargeEmissions,
        Self::EolEmissions,
    ];

    /// Returns the source spelling of the stream name.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::Import => "import",
            Self::Export => "export",
            Self::Recycle => "recycle",
            Self::Consumption => "consumption",
            Self::Equipment => "equipment",
            Self::PriorEquipment => "priorEquipment",
            Self::NewEquipment => "newEquipment",
            Self::RechargeEmissions => "rechargeEmissions",
            Self::EolEmissions => "eolEmissions",
            Self::Sales => "sales",
        }
    }

    /// Parses a stream from its source spelling.
    #[inline]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "domestic" => Self::Domestic,
            "import" => Self::Import,
            "export" => Self::Export,
            "recycle" => Self::Recycle,
            "consumption" => Self::Consumption,
            "equipment" => Self::Equipment,
            "priorEquipment" => Self::PriorEquipment,
            "newEquipment" => Self::NewEquipment,
            "rechargeEmissions" => Self::RechargeEmissions,
            "eolEmissions" => Self::EolEmissions,
            "sales" => Self::Sales,
            _ => return None,
        })
    }

    /// The unit values of this stream are stored in.
    #[inline]
    pub const fn base_unit(self) -> Unit {
        match self {
            Self::Domestic | Self::Import | Self::Export | Self::Recycle | Self::Sales => Unit::Kg,
            Self::Consumption | Self::RechargeEmissions | Self::EolEmissions => Unit::Tco2e,
            Self::Equipment | Self::PriorEquipment | Self::NewEquipment => Unit::EquipmentUnits,
        }
    }

    /// Whether this stream is computed from others rather than stored.
    #[inline]
    pub const fn is_virtual(self) -> bool {
        matches!(self, Self::Sales)
    }

    /// Whether writes to `sales` distribute into this stream.
    #[inline]
    pub const fn is_sales_substream(self) -> bool {
        matches!(self, Self::Domestic | Self::Import)
    }

    /// Whether this stream carries an initial charge parameterisation.
    #[inline]
    pub const fn is_charged_substream(self) -> bool {
        matches!(self, Self::Domestic | Self::Import | Self::Export)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
