use std::io::{Read, Seek};

use chrono::{NaiveDate, NaiveDateTime};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::codes::BitResult;
use super::{i16_le, i32_le, read_records, u16_le};
use crate::error::{Decoded, ErrorCode};
use crate::header::FileIndex;
use crate::io::Reader;
use crate::kind::DataKind;

/// Fields of the Variable Leader, in storage row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VariableField {
    VariableLeaderId,
    RdiEnsemble,
    RtcYear,
    RtcMonth,
    RtcDay,
    RtcHour,
    RtcMinute,
    RtcSecond,
    RtcHundredth,
    EnsembleMsb,
    BitResult,
    SpeedOfSound,
    DepthOfTransducer,
    Heading,
    Pitch,
    Roll,
    /// Salinity in ppt, unsigned, at record bytes 24..26. Rows 16 and 17 follow the
    /// instrument's byte order, salinity before temperature.
    Salinity,
    /// Temperature in 0.01 degrees C, signed, at record bytes 26..28.
    Temperature,
    MptMinute,
    MptSecond,
    MptHundredth,
    HdgStdDev,
    PitchStdDev,
    RollStdDev,
    AdcChannel0,
    AdcChannel1,
    AdcChannel2,
    AdcChannel3,
    AdcChannel4,
    AdcChannel5,
    AdcChannel6,
    AdcChannel7,
    ErrorStatusWord1,
    ErrorStatusWord2,
    ErrorStatusWord3,
    ErrorStatusWord4,
    Reserved,
    Pressure,
    PressureVariance,
    Spare,
    Y2kCentury,
    Y2kYear,
    Y2kMonth,
    Y2kDay,
    Y2kHour,
    Y2kMinute,
    Y2kSecond,
    Y2kHundredth,
}

impl VariableField {
    pub const ALL: [VariableField; 48] = [
        VariableField::VariableLeaderId,
        VariableField::RdiEnsemble,
        VariableField::RtcYear,
        VariableField::RtcMonth,
        VariableField::RtcDay,
        VariableField::RtcHour,
        VariableField::RtcMinute,
        VariableField::RtcSecond,
        VariableField::RtcHundredth,
        VariableField::EnsembleMsb,
        VariableField::BitResult,
        VariableField::SpeedOfSound,
        VariableField::DepthOfTransducer,
        VariableField::Heading,
        VariableField::Pitch,
        VariableField::Roll,
        VariableField::Salinity,
        VariableField::Temperature,
        VariableField::MptMinute,
        VariableField::MptSecond,
        VariableField::MptHundredth,
        VariableField::HdgStdDev,
        VariableField::PitchStdDev,
        VariableField::RollStdDev,
        VariableField::AdcChannel0,
        VariableField::AdcChannel1,
        VariableField::AdcChannel2,
        VariableField::AdcChannel3,
        VariableField::AdcChannel4,
        VariableField::AdcChannel5,
        VariableField::AdcChannel6,
        VariableField::AdcChannel7,
        VariableField::ErrorStatusWord1,
        VariableField::ErrorStatusWord2,
        VariableField::ErrorStatusWord3,
        VariableField::ErrorStatusWord4,
        VariableField::Reserved,
        VariableField::Pressure,
        VariableField::PressureVariance,
        VariableField::Spare,
        VariableField::Y2kCentury,
        VariableField::Y2kYear,
        VariableField::Y2kMonth,
        VariableField::Y2kDay,
        VariableField::Y2kHour,
        VariableField::Y2kMinute,
        VariableField::Y2kSecond,
        VariableField::Y2kHundredth,
    ];

    /// Row of this field in [VariableLeader::data].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            VariableField::VariableLeaderId => "Variable Leader ID",
            VariableField::RdiEnsemble => "RDI Ensemble",
            VariableField::RtcYear => "RTC Year",
            VariableField::RtcMonth => "RTC Month",
            VariableField::RtcDay => "RTC Day",
            VariableField::RtcHour => "RTC Hour",
            VariableField::RtcMinute => "RTC Minute",
            VariableField::RtcSecond => "RTC Second",
            VariableField::RtcHundredth => "RTC Hundredth",
            VariableField::EnsembleMsb => "Ensemble MSB",
            VariableField::BitResult => "Bit Result",
            VariableField::SpeedOfSound => "Speed of Sound",
            VariableField::DepthOfTransducer => "Depth of Transducer",
            VariableField::Heading => "Heading",
            VariableField::Pitch => "Pitch",
            VariableField::Roll => "Roll",
            VariableField::Salinity => "Salinity",
            VariableField::Temperature => "Temperature",
            VariableField::MptMinute => "MPT Minute",
            VariableField::MptSecond => "MPT Second",
            VariableField::MptHundredth => "MPT Hundredth",
            VariableField::HdgStdDev => "Hdg Std Dev",
            VariableField::PitchStdDev => "Pitch Std Dev",
            VariableField::RollStdDev => "Roll Std Dev",
            VariableField::AdcChannel0 => "ADC Channel 0",
            VariableField::AdcChannel1 => "ADC Channel 1",
            VariableField::AdcChannel2 => "ADC Channel 2",
            VariableField::AdcChannel3 => "ADC Channel 3",
            VariableField::AdcChannel4 => "ADC Channel 4",
            VariableField::AdcChannel5 => "ADC Channel 5",
            VariableField::AdcChannel6 => "ADC Channel 6",
            VariableField::AdcChannel7 => "ADC Channel 7",
            VariableField::ErrorStatusWord1 => "Error Status Word 1",
            VariableField::ErrorStatusWord2 => "Error Status Word 2",
            VariableField::ErrorStatusWord3 => "Error Status Word 3",
            VariableField::ErrorStatusWord4 => "Error Status Word 4",
            VariableField::Reserved => "Reserved",
            VariableField::Pressure => "Pressure",
            VariableField::PressureVariance => "Pressure Variance",
            VariableField::Spare => "Spare",
            VariableField::Y2kCentury => "Y2K Century",
            VariableField::Y2kYear => "Y2K Year",
            VariableField::Y2kMonth => "Y2K Month",
            VariableField::Y2kDay => "Y2K Day",
            VariableField::Y2kHour => "Y2K Hour",
            VariableField::Y2kMinute => "Y2K Minute",
            VariableField::Y2kSecond => "Y2K Second",
            VariableField::Y2kHundredth => "Y2K Hundredth",
        }
    }
}

/// Decoded Variable Leaders, one column per ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLeader {
    /// Shape `(48, ensembles)`, rows ordered as [VariableField::ALL].
    pub data: Array2<i32>,
}

impl VariableLeader {
    /// Record length in bytes.
    pub const LEN: usize = 65;
    /// Number of decoded fields.
    pub const FIELDS: usize = 48;

    #[must_use]
    pub fn empty() -> Self {
        VariableLeader {
            data: Array2::zeros((Self::FIELDS, 0)),
        }
    }

    #[must_use]
    pub fn ensembles(&self) -> usize {
        self.data.ncols()
    }

    #[must_use]
    pub fn get(&self, field: VariableField) -> ArrayView1<'_, i32> {
        self.data.row(field.index())
    }

    #[must_use]
    pub fn value(&self, field: VariableField, ensemble: usize) -> Option<i32> {
        self.data.get((field.index(), ensemble)).copied()
    }

    /// Ensemble time from the Y2K real-time clock fields, `None` where the fields do
    /// not form a valid date and time.
    #[must_use]
    pub fn timestamps(&self) -> Vec<Option<NaiveDateTime>> {
        (0..self.ensembles()).map(|e| self.timestamp(e)).collect()
    }

    #[must_use]
    pub fn timestamp(&self, ensemble: usize) -> Option<NaiveDateTime> {
        let v = |f: VariableField| self.value(f, ensemble);
        let u = |f: VariableField| v(f).and_then(|x| u32::try_from(x).ok());

        let year = v(VariableField::Y2kCentury)? * 100 + v(VariableField::Y2kYear)?;
        NaiveDate::from_ymd_opt(year, u(VariableField::Y2kMonth)?, u(VariableField::Y2kDay)?)?
            .and_hms_milli_opt(
                u(VariableField::Y2kHour)?,
                u(VariableField::Y2kMinute)?,
                u(VariableField::Y2kSecond)?,
                u(VariableField::Y2kHundredth)? * 10,
            )
    }

    #[must_use]
    pub fn bit_result(&self, ensemble: usize) -> Option<BitResult> {
        let code = self.value(VariableField::BitResult, ensemble)?;
        Some(BitResult::decode(u16::try_from(code).ok()?))
    }

    /// Keep only the first `n` ensembles.
    pub fn truncate(&mut self, n: usize) {
        let n = n.min(self.ensembles());
        self.data = self.data.slice(ndarray::s![.., ..n]).to_owned();
    }
}

fn decode(r: &[u8]) -> [i32; VariableLeader::FIELDS] {
    let mut vals = [0i32; VariableLeader::FIELDS];
    vals[0] = i32::from(u16_le(r, 0));
    vals[1] = i32::from(u16_le(r, 2));
    // RTC year through hundredth, ensemble msb
    for (k, at) in (4..12).enumerate() {
        vals[2 + k] = i32::from(r[at]);
    }
    vals[10] = i32::from(u16_le(r, 12));
    vals[11] = i32::from(u16_le(r, 14));
    vals[12] = i32::from(u16_le(r, 16));
    vals[13] = i32::from(u16_le(r, 18));
    vals[14] = i32::from(i16_le(r, 20));
    vals[15] = i32::from(i16_le(r, 22));
    vals[16] = i32::from(u16_le(r, 24));
    vals[17] = i32::from(i16_le(r, 26));
    // MPT, standard deviations, ADC channels, error status words
    for (k, at) in (28..46).enumerate() {
        vals[18 + k] = i32::from(r[at]);
    }
    vals[36] = i32::from(u16_le(r, 46));
    vals[37] = i32_le(r, 48);
    vals[38] = i32_le(r, 52);
    vals[39] = i32::from(r[56]);
    for (k, at) in (57..65).enumerate() {
        vals[40 + k] = i32::from(r[at]);
    }
    vals
}

/// Decode the Variable Leader of every ensemble in `index`.
pub(crate) fn extract<R>(reader: &mut Reader<R>, index: &FileIndex) -> Decoded<VariableLeader>
where
    R: Read + Seek,
{
    let (records, error) = read_records(
        reader,
        index,
        &DataKind::VARIABLE_LEADER_IDS,
        VariableLeader::LEN,
        "variableleader",
    );
    let columns: Vec<_> = records.par_iter().map(|r| decode(r)).collect();
    let n = columns.len();
    let data = Array2::from_shape_fn((VariableLeader::FIELDS, n), |(f, e)| columns[e][f]);

    let error = index.resolve_error(error);
    debug!(ensembles = n, %error, "decoded variable leaders");
    Decoded::new(VariableLeader { data }, n, error)
}
