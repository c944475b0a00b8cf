#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const FIXED_LEADER: u16 = 0x0000;
pub const VARIABLE_LEADER: u16 = 0x0080;
pub const VELOCITY: u16 = 0x0100;
pub const CORRELATION: u16 = 0x0200;
pub const ECHO: u16 = 0x0300;
pub const PERCENT_GOOD: u16 = 0x0400;
pub const STATUS: u16 = 0x0500;
pub const BOTTOM_TRACK: u16 = 0x0600;

const FIXED_LEADER_LEN: usize = 59;
const VARIABLE_LEADER_LEN: usize = 65;
const BOTTOM_TRACK_LEN: usize = 85;

/// Velocity written for `beam`/`cell` of the ensemble numbered `ensemble_no`.
pub fn velocity_at(ensemble_no: u16, beam: usize, cell: usize) -> i16 {
    i16::try_from(beam * 1000 + cell).unwrap() - i16::try_from(ensemble_no).unwrap()
}

/// Byte written for `beam`/`cell` of an 8-bit data type with id `id`.
pub fn byte_at(id: u16, ensemble_no: u16, beam: usize, cell: usize) -> u8 {
    ((beam * 40 + cell + usize::from(ensemble_no) + usize::from(id >> 8)) % 256) as u8
}

/// Synthetic PD0 ensemble with correct offsets and checksum.
#[derive(Debug, Clone)]
pub struct EnsembleBuilder {
    pub beams: u8,
    pub cells: u8,
    pub ensemble_no: u16,
    /// Sub-records in offset-table order.
    pub ids: Vec<u16>,
    pub cpu_version: u8,
    pub system_config: u16,
    pub coord_transform: u8,
    pub sensor_source: u8,
    pub cpu_serial: u64,
    pub instrument_no: u32,
    pub beam_angle: u8,
    pub heading: u16,
    pub pitch: i16,
    pub roll: i16,
    pub salinity: u16,
    pub temperature: i16,
    pub pressure: i32,
    pub pressure_variance: i32,
    /// Y2K century, year, month, day, hour, minute, second, hundredth.
    pub y2k: [u8; 8],
}

impl Default for EnsembleBuilder {
    fn default() -> Self {
        EnsembleBuilder {
            beams: 4,
            cells: 30,
            ensemble_no: 1,
            ids: vec![
                FIXED_LEADER,
                VARIABLE_LEADER,
                VELOCITY,
                CORRELATION,
                ECHO,
                PERCENT_GOOD,
                BOTTOM_TRACK,
            ],
            cpu_version: 50,
            system_config: 0x4A4A,
            coord_transform: 0x1F,
            sensor_source: 0x7D,
            cpu_serial: 0x0000_1234_5678_9ABC,
            instrument_no: 24061,
            beam_angle: 20,
            heading: 9000,
            pitch: -150,
            roll: 75,
            salinity: 35,
            temperature: 2150,
            pressure: 102_300,
            pressure_variance: 12,
            y2k: [20, 24, 3, 15, 12, 30, 45, 50],
        }
    }
}

impl EnsembleBuilder {
    pub fn with_ids(mut self, ids: &[u16]) -> Self {
        self.ids = ids.to_vec();
        self
    }

    pub fn with_geometry(mut self, beams: u8, cells: u8) -> Self {
        self.beams = beams;
        self.cells = cells;
        self
    }

    pub fn numbered(mut self, ensemble_no: u16) -> Self {
        self.ensemble_no = ensemble_no;
        self
    }

    fn section(&self, id: u16) -> Vec<u8> {
        match id {
            0 | 1 => self.fixed_leader(id),
            128 | 129 => self.variable_leader(id),
            256 | 257 => {
                let mut dat = id.to_le_bytes().to_vec();
                for b in 0..usize::from(self.beams) {
                    for c in 0..usize::from(self.cells) {
                        dat.extend_from_slice(&velocity_at(self.ensemble_no, b, c).to_le_bytes());
                    }
                }
                dat
            }
            512 | 513 | 768 | 769 | 1024 | 1025 | 1280 | 1281 => {
                let mut dat = id.to_le_bytes().to_vec();
                for b in 0..usize::from(self.beams) {
                    for c in 0..usize::from(self.cells) {
                        dat.push(byte_at(id, self.ensemble_no, b, c));
                    }
                }
                dat
            }
            1536 => {
                let mut dat = id.to_le_bytes().to_vec();
                dat.resize(BOTTOM_TRACK_LEN, 0);
                dat
            }
            _ => id.to_le_bytes().to_vec(),
        }
    }

    fn fixed_leader(&self, id: u16) -> Vec<u8> {
        let mut r = vec![0u8; FIXED_LEADER_LEN];
        r[0..2].copy_from_slice(&id.to_le_bytes());
        r[2] = self.cpu_version;
        r[3] = 40;
        r[4..6].copy_from_slice(&self.system_config.to_le_bytes());
        r[8] = self.beams;
        r[9] = self.cells;
        r[10..12].copy_from_slice(&100u16.to_le_bytes());
        r[12..14].copy_from_slice(&400u16.to_le_bytes());
        r[14..16].copy_from_slice(&176u16.to_le_bytes());
        r[17] = 64;
        r[25] = self.coord_transform;
        r[30] = self.sensor_source;
        r[31] = self.sensor_source;
        r[32..34].copy_from_slice(&600u16.to_le_bytes());
        r[42..50].copy_from_slice(&self.cpu_serial.to_be_bytes());
        r[50..52].copy_from_slice(&1u16.to_le_bytes());
        r[52] = 255;
        r[54..58].copy_from_slice(&self.instrument_no.to_le_bytes());
        r[58] = self.beam_angle;
        r
    }

    fn variable_leader(&self, id: u16) -> Vec<u8> {
        let mut r = vec![0u8; VARIABLE_LEADER_LEN];
        r[0..2].copy_from_slice(&id.to_le_bytes());
        r[2..4].copy_from_slice(&self.ensemble_no.to_le_bytes());
        r[4..11].copy_from_slice(&self.y2k[1..8]);
        r[14..16].copy_from_slice(&1500u16.to_le_bytes());
        r[18..20].copy_from_slice(&self.heading.to_le_bytes());
        r[20..22].copy_from_slice(&self.pitch.to_le_bytes());
        r[22..24].copy_from_slice(&self.roll.to_le_bytes());
        r[24..26].copy_from_slice(&self.salinity.to_le_bytes());
        r[26..28].copy_from_slice(&self.temperature.to_le_bytes());
        r[48..52].copy_from_slice(&self.pressure.to_le_bytes());
        r[52..56].copy_from_slice(&self.pressure_variance.to_le_bytes());
        r[57..65].copy_from_slice(&self.y2k);
        r
    }

    /// Offset of each sub-record from the start of the ensemble.
    pub fn offsets(&self) -> Vec<usize> {
        let mut at = 6 + 2 * self.ids.len();
        self.ids
            .iter()
            .map(|id| {
                let start = at;
                at += self.section(*id).len();
                start
            })
            .collect()
    }

    pub fn build(&self) -> Vec<u8> {
        let sections: Vec<Vec<u8>> = self.ids.iter().map(|id| self.section(*id)).collect();
        let offsets = self.offsets();
        let byte_count = 6 + 2 * self.ids.len() + sections.iter().map(Vec::len).sum::<usize>();

        let mut dat = vec![0x7f, 0x7f];
        dat.extend_from_slice(&u16::try_from(byte_count).unwrap().to_le_bytes());
        dat.push(0);
        dat.push(u8::try_from(self.ids.len()).unwrap());
        for off in offsets {
            dat.extend_from_slice(&u16::try_from(off).unwrap().to_le_bytes());
        }
        for s in sections {
            dat.extend(s);
        }
        let checksum = dat.iter().fold(0u32, |acc, b| acc + u32::from(*b)) & 0xFFFF;
        dat.extend_from_slice(&(checksum as u16).to_le_bytes());
        assert_eq!(dat.len(), byte_count + 2);
        dat
    }
}

/// `n` default ensembles numbered from 1.
pub fn ensembles(n: u16) -> Vec<Vec<u8>> {
    (1..=n)
        .map(|i| EnsembleBuilder::default().numbered(i).build())
        .collect()
}

pub fn write_file(ensembles: &[Vec<u8>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for ens in ensembles {
        file.write_all(ens).unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn write_bytes(dat: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(dat).unwrap();
    file.flush().unwrap();
    file
}
