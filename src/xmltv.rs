//! XMLTV channel/programme records and rendering.
//!
//! Timestamps use the XMLTV on-wire format `%Y%m%d%H%M%S %z`
//! (e.g. `20240101120000 +0000`). All rendered fields are XML-escaped.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

pub const EPG_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub tvg_id: String,
    pub tvg_name: String,
    pub tvg_logo: String,
    pub epg_desc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub tvg_id: String,
    pub epg_title: String,
    pub epg_start: String,
    pub epg_stop: String,
    pub epg_desc: String,
}

/// Current time in the given IANA timezone; unknown names fall back to UTC.
pub fn now_in(tz_name: &str) -> DateTime<chrono_tz::Tz> {
    let tz: chrono_tz::Tz = tz_name.parse().unwrap_or(chrono_tz::UTC);
    Utc::now().with_timezone(&tz)
}

pub fn format_epg_time<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format(EPG_TIME_FORMAT).to_string()
}

pub fn parse_epg_time(value: &str) -> chrono::ParseResult<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, EPG_TIME_FORMAT)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render channels and programmes into a complete XMLTV document.
/// `origin` is the source panel origin, carried as generator metadata.
pub fn render_xmltv(channels: &[Channel], programs: &[Program], origin: &str) -> String {
    let mut xmltv = String::new();
    xmltv.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xmltv.push_str("<!DOCTYPE tv SYSTEM \"xmltv.dtd\">\n");
    xmltv.push_str(&format!(
        "<tv generator-info-name=\"plexarr\" generator-info-url=\"{}\">\n",
        escape_xml(origin)
    ));

    for channel in channels {
        xmltv.push_str(&format!(
            "  <channel id=\"{}\">\n",
            escape_xml(&channel.tvg_id)
        ));
        xmltv.push_str(&format!(
            "    <display-name>{}</display-name>\n",
            escape_xml(&channel.tvg_name)
        ));
        if !channel.tvg_logo.is_empty() {
            xmltv.push_str(&format!(
                "    <icon src=\"{}\" />\n",
                escape_xml(&channel.tvg_logo)
            ));
        }
        if !channel.epg_desc.is_empty() {
            xmltv.push_str(&format!(
                "    <desc>{}</desc>\n",
                escape_xml(&channel.epg_desc)
            ));
        }
        xmltv.push_str("  </channel>\n");
    }

    for program in programs {
        xmltv.push_str(&format!(
            "  <programme channel=\"{}\" start=\"{}\" stop=\"{}\">\n",
            escape_xml(&program.tvg_id),
            escape_xml(&program.epg_start),
            escape_xml(&program.epg_stop)
        ));
        xmltv.push_str(&format!(
            "    <title>{}</title>\n",
            escape_xml(&program.epg_title)
        ));
        if !program.epg_desc.is_empty() {
            xmltv.push_str(&format!(
                "    <desc>{}</desc>\n",
                escape_xml(&program.epg_desc)
            ));
        }
        xmltv.push_str("  </programme>\n");
    }

    xmltv.push_str("</tv>\n");
    xmltv
}

/// Read an XMLTV document back into channel/programme records.
/// Only the fields this crate renders are recovered.
pub fn parse_xmltv(xml: &str) -> Result<(Vec<Channel>, Vec<Program>), anyhow::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut channels = Vec::new();
    let mut programs = Vec::new();
    let mut current_channel: Option<Channel> = None;
    let mut current_program: Option<Program> = None;
    let mut current_tag: Option<Vec<u8>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"channel" => {
                    let mut channel = Channel::default();
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"id" {
                            channel.tvg_id = attr.unescape_value()?.into_owned();
                        }
                    }
                    current_channel = Some(channel);
                }
                b"programme" => {
                    let mut program = Program::default();
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"channel" => program.tvg_id = value,
                            b"start" => program.epg_start = value,
                            b"stop" => program.epg_stop = value,
                            _ => {}
                        }
                    }
                    current_program = Some(program);
                }
                tag @ (b"display-name" | b"title" | b"desc") => {
                    current_tag = Some(tag.to_vec());
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"icon" {
                    if let Some(channel) = current_channel.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"src" {
                                channel.tvg_logo = attr.unescape_value()?.into_owned();
                            }
                        }
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                match current_tag.as_deref() {
                    Some(b"display-name") => {
                        if let Some(channel) = current_channel.as_mut() {
                            channel.tvg_name = text;
                        }
                    }
                    Some(b"title") => {
                        if let Some(program) = current_program.as_mut() {
                            program.epg_title = text;
                        }
                    }
                    Some(b"desc") => {
                        if let Some(program) = current_program.as_mut() {
                            program.epg_desc = text;
                        } else if let Some(channel) = current_channel.as_mut() {
                            channel.epg_desc = text;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"channel" => {
                    if let Some(channel) = current_channel.take() {
                        channels.push(channel);
                    }
                }
                b"programme" => {
                    if let Some(program) = current_program.take() {
                        programs.push(program);
                    }
                }
                b"display-name" | b"title" | b"desc" => current_tag = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((channels, programs))
}
