use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use handlebars::handlebars_helper;
use pd0::leader::codes::{CoordinateTransform, SystemConfiguration};
use pd0::{check_file, Decoder, FileCheck};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Component {
    name: &'static str,
    ensembles: usize,
    code: u8,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    ensembles: usize,
    data_types: Vec<String>,
    components: Vec<Component>,
    check: Option<FileCheck>,
    system_configuration: Option<SystemConfiguration>,
    coordinate_transform: Option<CoordinateTransform>,
    beams: Option<usize>,
    cells: Option<usize>,
    serial_missing: bool,
    first_ensemble_time: Option<NaiveDateTime>,
    last_ensemble_time: Option<NaiveDateTime>,
}

fn summarize(fpath: &Path, decoder: &Decoder) -> Info {
    let file = decoder.read(fpath);

    let errors = file.errors();
    let components = file
        .ensembles()
        .into_iter()
        .zip(errors)
        .map(|((name, ensembles), (_, code))| Component {
            name,
            ensembles,
            code: code.code(),
            message: code.message(),
        })
        .collect();

    let check = if file.index.data.is_empty() {
        None
    } else {
        check_file(fpath, &file.index.data)
            .map_err(|code| warn!(%code, "file check failed"))
            .ok()
    };

    let fixed = &file.fixed_leader.data;
    let times = file.variable_leader.data.timestamps();

    Info {
        filename: fpath.to_string_lossy().to_string(),
        ensembles: file.index.ensembles,
        data_types: file
            .index
            .data
            .data_kinds(0)
            .into_iter()
            .map(|k| k.to_string())
            .collect(),
        components,
        check,
        system_configuration: fixed.system_configuration(0),
        coordinate_transform: fixed.coordinate_transform(0),
        beams: fixed.beams().first().copied(),
        cells: fixed.cells().first().copied(),
        serial_missing: fixed.serial_missing,
        first_ensemble_time: times.iter().flatten().min().copied(),
        last_ensemble_time: times.iter().flatten().max().copied(),
    }
}

pub fn info(fpath: &Path, format: &Format, decoder: &Decoder) -> Result<()> {
    let info = summarize(fpath, decoder);

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let num = usize::try_from(num).unwrap_or(0).max(v.len());
        format!("{v:>num$}")
    });
    handlebars_helper!(right_pad: |num: u64, v: str| {
        let num = usize::try_from(num).unwrap_or(0);
        format!("{v:<num$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_helper("rpad", Box::new(right_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================================
Ensembles:  {{ ensembles }}
Data Types: {{ #each data_types }}{{ this }}{{ #if @last }}{{ else }}, {{ /if }}{{ /each }}
First:      {{ first_ensemble_time }}
Last:       {{ last_ensemble_time }}
Beams:      {{ beams }}
Cells:      {{ cells }}
{{ #if system_configuration }}Frequency:  {{ system_configuration.frequency_khz }} kHz
{{ /if }}{{ #if coordinate_transform }}Frame:      {{ coordinate_transform.frame }}
{{ /if }}{{ #if serial_missing }}CPU serial number missing; serial and following fields zeroed
{{ /if }}{{ #if check }}Size:       {{ check.system_file_size }} bytes on disk, {{ check.calculated_file_size }} indexed
Uniform:    byte count {{ check.byte_uniformity }}, data types {{ check.datatype_uniformity }}
{{ /if }}-----------------------------------------------------------------------------------------------
Component          Ensembles  Code  Message
-----------------------------------------------------------------------------------------------
{{ #each components }}{{ rpad 19 name }}{{ lpad 9 ensembles }}  {{ lpad 4 code }}  {{ message }}
{{/each }}
";
