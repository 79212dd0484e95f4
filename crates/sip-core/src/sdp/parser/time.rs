//! Timing lines: `t=`, `r=` and `z=`.

use crate::error::Result;
use crate::parser::core::ParserCore;
use crate::sdp::fields::{Repeat, SdpField, Time, Zone, ZoneAdjustment};
use crate::sdp::parser::{SdpFieldParser, SdpGrammar};

field_parser!(
    /// `t=<start-time> <stop-time>`
    TimeParser
);
field_parser!(
    /// `r=<repeat interval> <active duration> <offsets from start-time>`
    RepeatParser
);
field_parser!(
    /// `z=<adjustment time> <offset> ...`
    ZoneParser
);

impl TimeParser {
    fn time(&mut self) -> Result<Time> {
        self.field_tag('t')?;
        let start = self.unsigned("start time")?;
        self.space()?;
        let stop = self.unsigned("stop time")?;
        self.expect_end("t=")?;
        Ok(Time { start, stop })
    }
}

impl SdpFieldParser for TimeParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.time().map(SdpField::Time).map_err(|e| e.in_field("t="))
    }
}

impl RepeatParser {
    fn repeat(&mut self) -> Result<Repeat> {
        self.field_tag('r')?;
        let interval = self.typed_time(false)?;
        self.space()?;
        let active_duration = self.typed_time(false)?;
        let mut offsets = Vec::new();
        while self.lexer().has_more_chars() {
            self.space()?;
            offsets.push(self.typed_time(false)?);
        }
        if offsets.is_empty() {
            return Err(self.lexical_error("expected at least one offset").into());
        }
        Ok(Repeat {
            interval,
            active_duration,
            offsets,
        })
    }
}

impl SdpFieldParser for RepeatParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.repeat().map(SdpField::Repeat).map_err(|e| e.in_field("r="))
    }
}

impl ZoneParser {
    fn zone(&mut self) -> Result<Zone> {
        self.field_tag('z')?;
        let mut adjustments = Vec::new();
        loop {
            let time = self.unsigned("adjustment time")?;
            self.space()?;
            let offset = self.typed_time(true)?;
            adjustments.push(ZoneAdjustment { time, offset });
            if !self.lexer().has_more_chars() {
                break;
            }
            self.space()?;
        }
        Ok(Zone { adjustments })
    }
}

impl SdpFieldParser for ZoneParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.zone().map(SdpField::Zone).map_err(|e| e.in_field("z="))
    }
}
