//! goaccess format profiles for the two supported log sources.

use std::io::{self, Write};

use tempfile::NamedTempFile;

use crate::contract::LogSource;

const STORAGE_DATE_FORMAT: &str = "%d/%b/%Y";
const STORAGE_LOG_FORMAT: &str = r#"%^[%d:%^] %h %^"%r" %s %^ %b %^ %^ %^ "%R" "%u" %^"#;

const EDGE_DATE_FORMAT: &str = "%Y-%m-%d";
// goaccess expands the literal `\t` escapes itself.
const EDGE_LOG_FORMAT: &str = r"%d\t%^\t%^\t%b\t%h\t%^\t%^\t%r\t%s\t%R\t%u\t%^";

/// Date/line grammar handed to goaccess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    pub date_format: &'static str,
    pub log_format: &'static str,
    pub color_scheme: u8,
}

impl FormatProfile {
    pub fn for_source(source: LogSource) -> Self {
        match source {
            LogSource::Storage => FormatProfile {
                date_format: STORAGE_DATE_FORMAT,
                log_format: STORAGE_LOG_FORMAT,
                color_scheme: 0,
            },
            LogSource::EdgeCache => FormatProfile {
                date_format: EDGE_DATE_FORMAT,
                log_format: EDGE_LOG_FORMAT,
                color_scheme: 0,
            },
        }
    }

    /// goaccess config file content.
    pub fn render(&self) -> String {
        format!(
            "color_scheme {}\ndate_format {}\nlog_format {}\n",
            self.color_scheme, self.date_format, self.log_format
        )
    }

    /// Write the profile to a temporary file that is deleted on drop.
    pub fn write_temp(&self) -> io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("s3stat-")
            .suffix(".goaccessrc")
            .tempfile()?;
        file.write_all(self.render().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}
