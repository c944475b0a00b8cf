use std::io::{Read, Seek};

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::codes::{CoordinateTransform, SensorFlags, SystemConfiguration};
use super::{read_records, u16_le, u32_le};
use crate::error::{Decoded, ErrorCode};
use crate::header::FileIndex;
use crate::io::Reader;
use crate::kind::DataKind;

/// Fields of the Fixed Leader, in storage row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FixedField {
    FixedLeaderId,
    CpuVersion,
    CpuRevision,
    SystemConfigCode,
    RealFlag,
    LagLength,
    Beams,
    Cells,
    Pings,
    DepthCellLen,
    BlankTransmit,
    SignalMode,
    CorrelationThresh,
    CodeReps,
    PercentGoodMin,
    ErrorVelocityThresh,
    TpMinute,
    TpSecond,
    TpHundredth,
    CoordTransformCode,
    HeadAlignment,
    HeadBias,
    SensorSourceCode,
    SensorAvailCode,
    Bin1Dist,
    XmitPulseLen,
    RefLayerAvg,
    FalseTargetThresh,
    Spare1,
    TransmitLagDist,
    CpuSerialNo,
    SystemBandwidth,
    SystemPower,
    Spare2,
    InstrumentNo,
    BeamAngle,
}

impl FixedField {
    pub const ALL: [FixedField; 36] = [
        FixedField::FixedLeaderId,
        FixedField::CpuVersion,
        FixedField::CpuRevision,
        FixedField::SystemConfigCode,
        FixedField::RealFlag,
        FixedField::LagLength,
        FixedField::Beams,
        FixedField::Cells,
        FixedField::Pings,
        FixedField::DepthCellLen,
        FixedField::BlankTransmit,
        FixedField::SignalMode,
        FixedField::CorrelationThresh,
        FixedField::CodeReps,
        FixedField::PercentGoodMin,
        FixedField::ErrorVelocityThresh,
        FixedField::TpMinute,
        FixedField::TpSecond,
        FixedField::TpHundredth,
        FixedField::CoordTransformCode,
        FixedField::HeadAlignment,
        FixedField::HeadBias,
        FixedField::SensorSourceCode,
        FixedField::SensorAvailCode,
        FixedField::Bin1Dist,
        FixedField::XmitPulseLen,
        FixedField::RefLayerAvg,
        FixedField::FalseTargetThresh,
        FixedField::Spare1,
        FixedField::TransmitLagDist,
        FixedField::CpuSerialNo,
        FixedField::SystemBandwidth,
        FixedField::SystemPower,
        FixedField::Spare2,
        FixedField::InstrumentNo,
        FixedField::BeamAngle,
    ];

    /// Row of this field in [FixedLeader::data].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FixedField::FixedLeaderId => "Fixed Leader ID",
            FixedField::CpuVersion => "CPU Version",
            FixedField::CpuRevision => "CPU Revision",
            FixedField::SystemConfigCode => "System Config Code",
            FixedField::RealFlag => "Real Flag",
            FixedField::LagLength => "Lag Length",
            FixedField::Beams => "Beams",
            FixedField::Cells => "Cells",
            FixedField::Pings => "Pings",
            FixedField::DepthCellLen => "Depth Cell Len",
            FixedField::BlankTransmit => "Blank Transmit",
            FixedField::SignalMode => "Signal Mode",
            FixedField::CorrelationThresh => "Correlation Thresh",
            FixedField::CodeReps => "Code Reps",
            FixedField::PercentGoodMin => "Percent Good Min",
            FixedField::ErrorVelocityThresh => "Error Velocity Thresh",
            FixedField::TpMinute => "TP Minute",
            FixedField::TpSecond => "TP Second",
            FixedField::TpHundredth => "TP Hundredth",
            FixedField::CoordTransformCode => "Coord Transform Code",
            FixedField::HeadAlignment => "Head Alignment",
            FixedField::HeadBias => "Head Bias",
            FixedField::SensorSourceCode => "Sensor Source Code",
            FixedField::SensorAvailCode => "Sensor Avail Code",
            FixedField::Bin1Dist => "Bin 1 Dist",
            FixedField::XmitPulseLen => "Xmit Pulse Len",
            FixedField::RefLayerAvg => "Ref Layer Avg",
            FixedField::FalseTargetThresh => "False Target Thresh",
            FixedField::Spare1 => "Spare 1",
            FixedField::TransmitLagDist => "Transmit Lag Dist",
            FixedField::CpuSerialNo => "CPU Serial No",
            FixedField::SystemBandwidth => "System Bandwidth",
            FixedField::SystemPower => "System Power",
            FixedField::Spare2 => "Spare 2",
            FixedField::InstrumentNo => "Instrument No",
            FixedField::BeamAngle => "Beam Angle",
        }
    }
}

/// Decoded Fixed Leaders, one column per ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLeader {
    /// Shape `(36, ensembles)`, rows ordered as [FixedField::ALL].
    pub data: Array2<i64>,
    /// Set when the CPU serial number was unrepresentable in any ensemble. In that
    /// case the serial number and every field after it is zero for all ensembles.
    pub serial_missing: bool,
}

impl FixedLeader {
    /// Record length in bytes.
    pub const LEN: usize = 59;
    /// Number of decoded fields.
    pub const FIELDS: usize = 36;
    /// Value substituted for fields lost to the missing serial number.
    pub const MISSING_VALUE: i64 = 0;

    #[must_use]
    pub fn empty() -> Self {
        FixedLeader {
            data: Array2::zeros((Self::FIELDS, 0)),
            serial_missing: false,
        }
    }

    #[must_use]
    pub fn ensembles(&self) -> usize {
        self.data.ncols()
    }

    /// All values of `field`, one per ensemble.
    #[must_use]
    pub fn get(&self, field: FixedField) -> ArrayView1<'_, i64> {
        self.data.row(field.index())
    }

    #[must_use]
    pub fn value(&self, field: FixedField, ensemble: usize) -> Option<i64> {
        self.data.get((field.index(), ensemble)).copied()
    }

    /// Beam count of each ensemble.
    #[must_use]
    pub fn beams(&self) -> Vec<usize> {
        self.as_counts(FixedField::Beams)
    }

    /// Cell count of each ensemble.
    #[must_use]
    pub fn cells(&self) -> Vec<usize> {
        self.as_counts(FixedField::Cells)
    }

    fn as_counts(&self, field: FixedField) -> Vec<usize> {
        self.get(field)
            .iter()
            .map(|v| usize::try_from(*v).unwrap_or(0))
            .collect()
    }

    /// Whether every ensemble carries the same value, for each field.
    #[must_use]
    pub fn is_uniform(&self) -> Vec<(FixedField, bool)> {
        FixedField::ALL
            .into_iter()
            .map(|f| {
                let row = self.get(f);
                let uniform = row.iter().all(|v| Some(v) == row.first());
                (f, uniform)
            })
            .collect()
    }

    #[must_use]
    pub fn system_configuration(&self, ensemble: usize) -> Option<SystemConfiguration> {
        let code = self.value(FixedField::SystemConfigCode, ensemble)?;
        Some(SystemConfiguration::decode(u16::try_from(code).ok()?))
    }

    #[must_use]
    pub fn coordinate_transform(&self, ensemble: usize) -> Option<CoordinateTransform> {
        let code = self.value(FixedField::CoordTransformCode, ensemble)?;
        Some(CoordinateTransform::decode(u8::try_from(code).ok()?))
    }

    #[must_use]
    pub fn sensor_source(&self, ensemble: usize) -> Option<SensorFlags> {
        let code = self.value(FixedField::SensorSourceCode, ensemble)?;
        Some(SensorFlags::decode(u8::try_from(code).ok()?))
    }

    #[must_use]
    pub fn sensors_available(&self, ensemble: usize) -> Option<SensorFlags> {
        let code = self.value(FixedField::SensorAvailCode, ensemble)?;
        Some(SensorFlags::decode(u8::try_from(code).ok()?))
    }

    /// Keep only the first `n` ensembles.
    pub fn truncate(&mut self, n: usize) {
        let n = n.min(self.ensembles());
        self.data = self.data.slice(ndarray::s![.., ..n]).to_owned();
    }
}

/// Decode a single record. The flag is set if the CPU serial number does not fit an
/// `i64`.
fn decode(r: &[u8]) -> ([i64; FixedLeader::FIELDS], bool) {
    let mut serial = [0u8; 8];
    serial.copy_from_slice(&r[42..50]);
    let serial = u64::from_be_bytes(serial);
    let serial_missing = serial > i64::MAX as u64;

    let b = |at: usize| i64::from(r[at]);
    let h = |at: usize| i64::from(u16_le(r, at));
    (
        [
            h(0),
            b(2),
            b(3),
            h(4),
            b(6),
            b(7),
            b(8),
            b(9),
            h(10),
            h(12),
            h(14),
            b(16),
            b(17),
            b(18),
            b(19),
            h(20),
            b(22),
            b(23),
            b(24),
            b(25),
            h(26),
            h(28),
            b(30),
            b(31),
            h(32),
            h(34),
            h(36),
            b(38),
            b(39),
            h(40),
            i64::try_from(serial).unwrap_or(FixedLeader::MISSING_VALUE),
            h(50),
            b(52),
            b(53),
            i64::from(u32_le(r, 54)),
            b(58),
        ],
        serial_missing,
    )
}

/// Decode the Fixed Leader of every ensemble in `index`.
pub(crate) fn extract<R>(reader: &mut Reader<R>, index: &FileIndex) -> Decoded<FixedLeader>
where
    R: Read + Seek,
{
    let (records, error) = read_records(
        reader,
        index,
        &DataKind::FIXED_LEADER_IDS,
        FixedLeader::LEN,
        "fixedleader",
    );
    let columns: Vec<_> = records.par_iter().map(|r| decode(r)).collect();

    let serial_missing = columns.iter().any(|(_, missing)| *missing);
    if serial_missing {
        info!("fixedleader: invalid CPU serial number (old firmware); replacing serial number and following fields with {}", FixedLeader::MISSING_VALUE);
    }
    let first_missing = FixedField::CpuSerialNo.index();
    let n = columns.len();
    let data = Array2::from_shape_fn((FixedLeader::FIELDS, n), |(f, e)| {
        if serial_missing && f >= first_missing {
            FixedLeader::MISSING_VALUE
        } else {
            columns[e].0[f]
        }
    });

    let error = index.resolve_error(error);
    debug!(ensembles = n, %error, "decoded fixed leaders");
    Decoded::new(
        FixedLeader {
            data,
            serial_missing,
        },
        n,
        error,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Vec<u8> {
        let mut r = vec![0u8; FixedLeader::LEN];
        r[2] = 50; // cpu version
        r[3] = 40; // cpu revision
        r[4..6].copy_from_slice(&0x4A4Au16.to_le_bytes());
        r[8] = 4; // beams
        r[9] = 30; // cells
        r[10..12].copy_from_slice(&1000u16.to_le_bytes());
        r[25] = 0x1F; // coord transform
        r[42..50].copy_from_slice(&0x0102_0304_0506_0708u64.to_be_bytes());
        r[50..52].copy_from_slice(&1u16.to_le_bytes());
        r[52] = 255;
        r[54..58].copy_from_slice(&24061u32.to_le_bytes());
        r[58] = 20;
        r
    }

    #[test]
    fn field_order() {
        for (i, f) in FixedField::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert_eq!(FixedField::Beams.index(), 6);
        assert_eq!(FixedField::Cells.index(), 7);
        assert_eq!(FixedField::CpuSerialNo.index(), 30);
        assert_eq!(FixedField::BeamAngle.name(), "Beam Angle");
    }

    #[test]
    fn decode_record() {
        let (vals, missing) = decode(&record());

        assert!(!missing);
        assert_eq!(vals[FixedField::CpuVersion.index()], 50);
        assert_eq!(vals[FixedField::CpuRevision.index()], 40);
        assert_eq!(vals[FixedField::SystemConfigCode.index()], 0x4A4A);
        assert_eq!(vals[FixedField::Beams.index()], 4);
        assert_eq!(vals[FixedField::Cells.index()], 30);
        assert_eq!(vals[FixedField::Pings.index()], 1000);
        assert_eq!(vals[FixedField::CoordTransformCode.index()], 0x1F);
        assert_eq!(vals[FixedField::CpuSerialNo.index()], 0x0102_0304_0506_0708);
        assert_eq!(vals[FixedField::SystemBandwidth.index()], 1);
        assert_eq!(vals[FixedField::SystemPower.index()], 255);
        assert_eq!(vals[FixedField::InstrumentNo.index()], 24061);
        assert_eq!(vals[FixedField::BeamAngle.index()], 20);
    }

    #[test]
    fn decode_overflowing_serial() {
        let mut r = record();
        r[42..50].copy_from_slice(&u64::MAX.to_be_bytes());
        let (vals, missing) = decode(&r);
        assert!(missing);
        assert_eq!(vals[FixedField::CpuSerialNo.index()], 0);
    }

    #[test]
    fn leader_accessors() {
        let (vals, _) = decode(&record());
        let data = Array2::from_shape_fn((FixedLeader::FIELDS, 3), |(f, _)| vals[f]);
        let mut leader = FixedLeader {
            data,
            serial_missing: false,
        };

        assert_eq!(leader.ensembles(), 3);
        assert_eq!(leader.beams(), vec![4, 4, 4]);
        assert_eq!(leader.cells(), vec![30, 30, 30]);
        assert_eq!(leader.value(FixedField::BeamAngle, 2), Some(20));
        assert_eq!(leader.value(FixedField::BeamAngle, 3), None);
        assert!(leader.is_uniform().iter().all(|(_, u)| *u));
        let cfg = leader.system_configuration(0).unwrap();
        assert_eq!(cfg.frequency_khz, Some(300));

        leader.data[[FixedField::Cells.index(), 1]] = 20;
        let uniform: Vec<_> = leader
            .is_uniform()
            .into_iter()
            .filter(|(_, u)| !u)
            .map(|(f, _)| f)
            .collect();
        assert_eq!(uniform, vec![FixedField::Cells]);

        leader.truncate(1);
        assert_eq!(leader.ensembles(), 1);
        assert_eq!(leader.data.nrows(), FixedLeader::FIELDS);
    }

    #[test]
    fn empty_leader_shape() {
        assert_eq!(FixedLeader::empty().data.shape(), &[36, 0]);
    }
}
