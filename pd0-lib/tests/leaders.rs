mod common;

use chrono::NaiveDate;
use common::{
    ensembles, write_file, EnsembleBuilder, CORRELATION, FIXED_LEADER, VARIABLE_LEADER, VELOCITY,
};
use pd0::leader::codes::{CoordinateFrame, JanusConfiguration};
use pd0::{fileheader, fixedleader, variableleader, ErrorCode, FixedField, VariableField};

#[test]
fn fixed_leader_values() {
    let file = write_file(&ensembles(3));

    let zult = fixedleader(file.path(), None);

    assert_eq!(zult.error, ErrorCode::Success);
    assert_eq!(zult.ensembles, 3);
    let fl = zult.data;
    assert_eq!(fl.data.shape(), &[36, 3]);
    assert!(!fl.serial_missing);
    assert_eq!(fl.beams(), vec![4, 4, 4]);
    assert_eq!(fl.cells(), vec![30, 30, 30]);
    assert_eq!(fl.value(FixedField::BeamAngle, 0), Some(20));
    assert_eq!(fl.value(FixedField::CpuVersion, 2), Some(50));
    assert_eq!(fl.value(FixedField::Pings, 1), Some(100));
    assert_eq!(fl.value(FixedField::DepthCellLen, 1), Some(400));
    assert_eq!(fl.value(FixedField::InstrumentNo, 1), Some(24061));
    assert_eq!(fl.value(FixedField::CpuSerialNo, 0), Some(0x0000_1234_5678_9ABC));
    assert!(fl.is_uniform().iter().all(|(_, uniform)| *uniform));

    let cfg = fl.system_configuration(0).unwrap();
    assert_eq!(cfg.frequency_khz, Some(300));
    assert_eq!(cfg.janus_configuration, Some(JanusConfiguration::FourBeam));
    assert_eq!(fl.coordinate_transform(0).unwrap().frame, CoordinateFrame::Earth);
    assert!(fl.sensor_source(0).unwrap().heading);
    assert!(!fl.sensors_available(0).unwrap().conductivity);
}

#[test]
fn precomputed_index_gives_identical_results() {
    let file = write_file(&ensembles(4));
    let index = fileheader(file.path()).data;

    let with = fixedleader(file.path(), Some(&index));
    let without = fixedleader(file.path(), None);
    assert_eq!(with.data, without.data);
    assert_eq!(with.ensembles, without.ensembles);
    assert_eq!(with.error, without.error);

    let with = variableleader(file.path(), Some(&index));
    let without = variableleader(file.path(), None);
    assert_eq!(with.data, without.data);
    assert_eq!(with.error, without.error);
}

#[test]
fn fixed_leader_missing_from_first_ensemble() {
    let ens = vec![EnsembleBuilder::default()
        .with_ids(&[VARIABLE_LEADER, VELOCITY])
        .build()];
    let file = write_file(&ens);

    let zult = fixedleader(file.path(), None);

    assert_eq!(zult.error, ErrorCode::IdNotFound);
    assert_eq!(zult.ensembles, 0);
    assert_eq!(zult.data.data.shape(), &[36, 0]);
}

#[test]
fn variable_leader_missing_from_later_ensemble() {
    let with_vl = [FIXED_LEADER, VARIABLE_LEADER, VELOCITY];
    let without_vl = [FIXED_LEADER, VELOCITY, CORRELATION];
    let ens = vec![
        EnsembleBuilder::default().with_ids(&with_vl).build(),
        EnsembleBuilder::default().numbered(2).with_ids(&with_vl).build(),
        EnsembleBuilder::default().numbered(3).with_ids(&without_vl).build(),
    ];
    let file = write_file(&ens);

    let zult = variableleader(file.path(), None);

    assert_eq!(zult.error, ErrorCode::IdNotFound);
    assert_eq!(zult.ensembles, 2);
    assert_eq!(zult.data.data.shape(), &[48, 2]);
    assert_eq!(fixedleader(file.path(), None).ensembles, 3);
}

#[test]
fn variable_leader_missing_from_first_ensemble() {
    let ens = vec![EnsembleBuilder::default().with_ids(&[FIXED_LEADER, VELOCITY]).build()];
    let file = write_file(&ens);

    let zult = variableleader(file.path(), None);

    assert_eq!(zult.error, ErrorCode::IdNotFound);
    assert_eq!(zult.ensembles, 0);
    assert_eq!(zult.data.data.shape(), &[48, 0]);
}

#[test]
fn overflowing_serial_zeroes_all_ensembles() {
    let mut ens = ensembles(3);
    let mut bad = EnsembleBuilder::default().numbered(2);
    bad.cpu_serial = u64::MAX;
    ens[1] = bad.build();
    let file = write_file(&ens);

    let zult = fixedleader(file.path(), None);

    assert_eq!(zult.error, ErrorCode::Success);
    assert_eq!(zult.ensembles, 3);
    let fl = zult.data;
    assert!(fl.serial_missing);
    for field in &FixedField::ALL[FixedField::CpuSerialNo.index()..] {
        assert!(
            fl.get(*field).iter().all(|v| *v == 0),
            "{} should be zeroed",
            field.name()
        );
    }
    assert_eq!(fl.beams(), vec![4, 4, 4]);
}

#[test]
fn scan_error_is_inherited() {
    let mut ens = ensembles(2);
    ens.push(
        EnsembleBuilder::default()
            .numbered(3)
            .with_ids(&[0, 128, VELOCITY])
            .build(),
    );
    let file = write_file(&ens);

    let fixed = fixedleader(file.path(), None);
    assert_eq!(fixed.error, ErrorCode::DatatypeMismatch);
    assert_eq!(fixed.ensembles, 2);

    let variable = variableleader(file.path(), None);
    assert_eq!(variable.error, ErrorCode::DatatypeMismatch);
    assert_eq!(variable.ensembles, 2);
}

#[test]
fn wrong_file_type_yields_empty_leaders() {
    let mut ens = ensembles(2);
    ens[0][1] = 0;
    let file = write_file(&ens);

    let fixed = fixedleader(file.path(), None);
    assert_eq!(fixed.error, ErrorCode::WrongRdiFileType);
    assert_eq!(fixed.data.data.shape(), &[36, 0]);

    let variable = variableleader(file.path(), None);
    assert_eq!(variable.error, ErrorCode::WrongRdiFileType);
    assert_eq!(variable.data.data.shape(), &[48, 0]);
}

#[test]
fn variable_leader_values() {
    let file = write_file(&ensembles(3));

    let zult = variableleader(file.path(), None);

    assert_eq!(zult.error, ErrorCode::Success);
    let vl = zult.data;
    assert_eq!(vl.data.shape(), &[48, 3]);
    assert_eq!(vl.get(VariableField::RdiEnsemble).to_vec(), vec![1, 2, 3]);
    assert_eq!(vl.value(VariableField::Heading, 0), Some(9000));
    assert_eq!(vl.value(VariableField::Pitch, 0), Some(-150));
    assert_eq!(vl.value(VariableField::Roll, 0), Some(75));
    assert_eq!(vl.value(VariableField::Salinity, 0), Some(35));
    assert_eq!(vl.value(VariableField::Temperature, 0), Some(2150));
    assert_eq!(vl.value(VariableField::SpeedOfSound, 0), Some(1500));
    assert_eq!(vl.value(VariableField::Pressure, 2), Some(102_300));
    assert_eq!(vl.value(VariableField::PressureVariance, 2), Some(12));
    assert_eq!(vl.value(VariableField::RtcYear, 1), Some(24));
    assert_eq!(vl.value(VariableField::Y2kCentury, 1), Some(20));
    assert!(!vl.bit_result(0).unwrap().has_error());

    let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_milli_opt(12, 30, 45, 500)
        .unwrap();
    assert_eq!(vl.timestamps(), vec![Some(expected); 3]);
}

#[test]
fn multithreaded_decode_matches() {
    let file = write_file(&ensembles(16));
    let decoder = pd0::Decoder::builder().num_threads(3).build();

    let threaded = decoder.fixedleader(file.path(), None);
    let single = fixedleader(file.path(), None);

    assert_eq!(threaded.data, single.data);
    assert_eq!(
        decoder.variableleader(file.path(), None).data,
        variableleader(file.path(), None).data
    );
}

#[test]
fn inconsistent_index_stops_without_panic() {
    let file = write_file(&ensembles(3));
    let mut index = fileheader(file.path()).data;
    index.address_offset.truncate(1);

    let fixed = fixedleader(file.path(), Some(&index));
    assert_eq!(fixed.error, ErrorCode::IdNotFound);
    assert_eq!(fixed.ensembles, 1);

    let variable = variableleader(file.path(), Some(&index));
    assert_eq!(variable.error, ErrorCode::IdNotFound);
    assert_eq!(variable.ensembles, 1);
}
