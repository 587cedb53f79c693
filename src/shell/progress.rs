//! Progress display for background merges

/// Lets progress through only when it crosses into a new 10% band
#[derive(Debug, Clone, Default)]
pub struct ProgressThrottle {
    last_band: Option<u32>,
}

impl ProgressThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the band (0, 10, ..., 100) to display, or `None` if the
    /// display should not change
    pub fn update(&mut self, percent: f64) -> Option<u32> {
        let band = (percent.clamp(0.0, 100.0) / 10.0).floor() as u32 * 10;
        match self.last_band {
            Some(last) if band <= last => None,
            _ => {
                self.last_band = Some(band);
                Some(band)
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_band = None;
    }
}

/// Render a fixed-width bar such as `[#####     ]  50%`
pub fn render_bar(percent: u32) -> String {
    let filled = (percent.min(100) / 10) as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        " ".repeat(10 - filled),
        percent.min(100)
    )
}
