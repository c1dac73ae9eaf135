use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Summary of the granule-level `MTD_TL.xml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GranuleInfo {
    pub tile_id: Option<String>,
    pub sensing_time: Option<DateTime<Utc>>,
    /// e.g. `EPSG:32755`
    pub horizontal_cs_code: Option<String>,
    pub mean_sun_zenith: Option<f64>,
    pub mean_sun_azimuth: Option<f64>,
}

/// Read the identification and mean sun geometry of a granule. Absent fields stay `None`.
pub fn read_granule_info(path: &Path) -> Result<GranuleInfo> {
    let mut reader = Reader::from_file(path)?;
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut info = GranuleInfo::default();
    let mut curr = String::new();
    let mut in_mean_sun_angle = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                curr = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if curr == "Mean_Sun_Angle" {
                    in_mean_sun_angle = true;
                }
            }
            Event::End(ref e) => {
                if e.local_name().as_ref() == b"Mean_Sun_Angle" {
                    in_mean_sun_angle = false;
                }
                curr.clear();
            }
            Event::Text(e) => {
                let txt = e.unescape()?;
                match curr.as_str() {
                    "TILE_ID" => info.tile_id = Some(txt.to_string()),
                    "SENSING_TIME" => {
                        info.sensing_time = DateTime::parse_from_rfc3339(&txt)
                            .ok()
                            .map(|t| t.with_timezone(&Utc))
                    }
                    "HORIZONTAL_CS_CODE" => info.horizontal_cs_code = Some(txt.to_string()),
                    "ZENITH_ANGLE" if in_mean_sun_angle => {
                        info.mean_sun_zenith = txt.trim().parse().ok()
                    }
                    "AZIMUTH_ANGLE" if in_mean_sun_angle => {
                        info.mean_sun_azimuth = txt.trim().parse().ok()
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(info)
}
