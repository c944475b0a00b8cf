//! Bit-field decoders for the coded leader fields.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BeamPattern {
    Concave,
    Convex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BeamDirection {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BeamAngle {
    Degrees(u8),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JanusConfiguration {
    FourBeam,
    FiveBeamDemod,
    FiveBeamTwoDemod,
}

/// Decoded Fixed Leader system configuration word.
///
/// Fields whose bit pattern is not assigned by the instrument documentation are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemConfiguration {
    pub frequency_khz: Option<u16>,
    pub beam_pattern: BeamPattern,
    /// Sensor configuration number, 1 to 3.
    pub sensor_configuration: Option<u8>,
    pub transducer_attached: bool,
    pub beam_direction: BeamDirection,
    pub beam_angle: Option<BeamAngle>,
    pub janus_configuration: Option<JanusConfiguration>,
}

impl SystemConfiguration {
    #[must_use]
    pub fn decode(code: u16) -> Self {
        let frequency_khz = match code & 0x7 {
            0 => Some(75),
            1 => Some(150),
            2 => Some(300),
            3 => Some(600),
            4 => Some(1200),
            5 => Some(2400),
            6 => Some(38),
            _ => None,
        };
        let sensor_configuration = match (code >> 4) & 0x3 {
            3 => None,
            n => Some(n as u8 + 1),
        };
        let beam_angle = match (code >> 8) & 0xf {
            0 => Some(BeamAngle::Degrees(15)),
            1 => Some(BeamAngle::Degrees(20)),
            2 => Some(BeamAngle::Degrees(30)),
            3 => Some(BeamAngle::Other),
            7 => Some(BeamAngle::Degrees(25)),
            12 => Some(BeamAngle::Degrees(45)),
            _ => None,
        };
        let janus_configuration = match (code >> 12) & 0xf {
            4 => Some(JanusConfiguration::FourBeam),
            5 => Some(JanusConfiguration::FiveBeamDemod),
            15 => Some(JanusConfiguration::FiveBeamTwoDemod),
            _ => None,
        };
        SystemConfiguration {
            frequency_khz,
            beam_pattern: if code & 0x8 == 0 {
                BeamPattern::Concave
            } else {
                BeamPattern::Convex
            },
            sensor_configuration,
            transducer_attached: code & 0x40 != 0,
            beam_direction: if code & 0x80 == 0 {
                BeamDirection::Down
            } else {
                BeamDirection::Up
            },
            beam_angle,
            janus_configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinateFrame {
    Beam,
    Instrument,
    Ship,
    Earth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoordinateTransform {
    pub frame: CoordinateFrame,
    pub tilt_correction: bool,
    pub three_beam_solution: bool,
    pub bin_mapping: bool,
}

impl CoordinateTransform {
    #[must_use]
    pub fn decode(code: u8) -> Self {
        let frame = match (code >> 3) & 0x3 {
            0 => CoordinateFrame::Beam,
            1 => CoordinateFrame::Instrument,
            2 => CoordinateFrame::Ship,
            _ => CoordinateFrame::Earth,
        };
        CoordinateTransform {
            frame,
            tilt_correction: code & 0x4 != 0,
            three_beam_solution: code & 0x2 != 0,
            bin_mapping: code & 0x1 != 0,
        }
    }
}

/// Environmental sensor flags, used for both the sensor source and the sensors
/// available fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorFlags {
    pub sound_speed: bool,
    pub depth: bool,
    pub heading: bool,
    pub pitch: bool,
    pub roll: bool,
    pub conductivity: bool,
    pub temperature: bool,
}

impl SensorFlags {
    #[must_use]
    pub fn decode(code: u8) -> Self {
        let bit = |n: u8| (code >> n) & 1 == 1;
        SensorFlags {
            sound_speed: bit(6),
            depth: bit(5),
            heading: bit(4),
            pitch: bit(3),
            roll: bit(2),
            conductivity: bit(1),
            temperature: bit(0),
        }
    }
}

/// Built-in test result from the Variable Leader. A zero word is a pass; only the low
/// byte is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitResult {
    pub reserved_1: bool,
    pub reserved_2: bool,
    pub reserved_3: bool,
    pub demod_1_error: bool,
    pub demod_0_error: bool,
    pub reserved_4: bool,
    pub timing_card_error: bool,
    pub reserved_5: bool,
}

impl BitResult {
    #[must_use]
    pub fn decode(code: u16) -> Self {
        let bit = |n: u16| (code >> n) & 1 == 1;
        BitResult {
            reserved_1: bit(7),
            reserved_2: bit(6),
            reserved_3: bit(5),
            demod_1_error: bit(4),
            demod_0_error: bit(3),
            reserved_4: bit(2),
            timing_card_error: bit(1),
            reserved_5: bit(0),
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.demod_1_error || self.demod_0_error || self.timing_card_error
    }
}
