use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListeningOutput {
    pub event: &'static str,
    pub address: String,
    pub frame_format: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CallOutput {
    pub method: &'static str,
    pub service_id: u8,
    pub method_id: u8,
    pub sequence: u32,
    pub oneway: bool,
    pub request: String,
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecodedFrameOutput {
    pub frame_format: &'static str,
    pub length: u16,
    pub body_crc: String,
    pub header_crc: Option<String>,
    pub message_type: String,
    pub service_id: u8,
    pub method_id: u8,
    pub sequence: u32,
    pub payload_size: usize,
    pub payload_hex: String,
}

/// Field/value pairs for the table and pretty renderings.
trait Fields {
    fn fields(&self) -> Vec<(&'static str, String)>;
}

impl Fields for ListeningOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("event", self.event.to_string()),
            ("address", self.address.clone()),
            ("frame_format", self.frame_format.to_string()),
        ]
    }
}

impl Fields for CallOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("method", self.method.to_string()),
            ("service_id", self.service_id.to_string()),
            ("method_id", self.method_id.to_string()),
            ("sequence", self.sequence.to_string()),
            ("oneway", self.oneway.to_string()),
            ("request", self.request.clone()),
            ("result", self.result.clone().unwrap_or_else(|| "-".to_string())),
        ]
    }
}

impl Fields for DecodedFrameOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("frame_format", self.frame_format.to_string()),
            ("length", self.length.to_string()),
            ("body_crc", self.body_crc.clone()),
            (
                "header_crc",
                self.header_crc.clone().unwrap_or_else(|| "-".to_string()),
            ),
            ("message_type", self.message_type.clone()),
            ("service_id", self.service_id.to_string()),
            ("method_id", self.method_id.to_string()),
            ("sequence", self.sequence.to_string()),
            ("payload_size", self.payload_size.to_string()),
            ("payload_hex", self.payload_hex.clone()),
        ]
    }
}

pub fn print_listening(out: &ListeningOutput, format: OutputFormat) {
    print_record(out, format);
}

pub fn print_call(out: &CallOutput, format: OutputFormat) {
    print_record(out, format);
}

pub fn print_decoded(out: &DecodedFrameOutput, format: OutputFormat) {
    print_record(out, format);
}

fn print_record<T: Serialize + Fields>(out: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in out.fields() {
                table.add_row(vec![name.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = out
                .fields()
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}
